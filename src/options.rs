use std::path::PathBuf;

/// Reject pushes that introduce denylisted references or commits.
///
/// Install as `update` hook, which receives `<REF> <OLD> <NEW>`, or run with `--pre-receive`
/// to read `<old> <new> <ref>` lines from standard input.
#[derive(Debug, clap::Parser)]
#[clap(name = "gix-denylist", about, version)]
pub struct Args {
    /// The fully qualified name of the reference being updated.
    #[clap(required_unless_present_any = ["pre_receive", "check_policy"])]
    pub reference: Option<String>,
    /// The commit the reference pointed to before the push, all zeros if it is new.
    #[clap(required_unless_present_any = ["pre_receive", "check_policy"])]
    pub old: Option<String>,
    /// The commit the reference will point to, all zeros if it is being deleted.
    #[clap(required_unless_present_any = ["pre_receive", "check_policy"])]
    pub new: Option<String>,

    /// Read ref updates from standard input like a `pre-receive` hook.
    #[clap(long, conflicts_with_all = ["reference", "check_policy"])]
    pub pre_receive: bool,
    /// Rebuild the lookup cache if needed and print how many rules of each kind are active.
    #[clap(long, conflicts_with = "reference")]
    pub check_policy: bool,

    /// The denylist file [default: `denylist.file` or `denylist`].
    #[clap(long, value_name = "PATH")]
    pub denylist: Option<PathBuf>,
    /// The lookup cache [default: `denylist.cache` or the denylist path with `.cache` appended].
    #[clap(long, value_name = "PATH")]
    pub cache: Option<PathBuf>,
    /// A file whose text is shown on rejection, with `_ERROR_` replaced by the reason.
    #[clap(long, value_name = "PATH")]
    pub template: Option<PathBuf>,
    /// A program receiving the sanitized annotation as argument and printing its display form.
    #[clap(long, value_name = "CMD")]
    pub formatter: Option<String>,
    /// The repository to read commits from [default: `$GIT_DIR` or `.`].
    #[clap(long, value_name = "PATH", env = "GIT_DIR")]
    pub git_dir: Option<PathBuf>,

    /// Log what is being done, overridden by `GIX_DENYLIST_LOG`.
    #[clap(long, short = 'v')]
    pub verbose: bool,
}
