use crate::{optimize::Passes, Stage};
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(StructOpt)]
#[structopt(about = "Compiles T.O.A.L. programs to JavaScript")]
pub struct Args {
    /// Program to compile. Without one, lines are read from a prompt.
    #[structopt(name = "FILE_NAME")]
    pub file_name: Option<PathBuf>,

    /// How far to run the pipeline: parsed, analyzed, optimized or js.
    #[structopt(name = "OUTPUT", default_value = "js")]
    pub output: Stage,

    /// Do not fold constant expressions.
    #[structopt(long)]
    pub no_fold: bool,

    /// Do not remove unreachable statements.
    #[structopt(long)]
    pub no_prune: bool,
}

impl Default for Args {
    fn default() -> Self {
        Self::new()
    }
}

impl Args {
    pub fn new() -> Self {
        Self::from_args()
    }

    pub fn passes(&self) -> Passes {
        let mut passes = Passes::all();
        passes.set(Passes::FOLD, !self.no_fold);
        passes.set(Passes::PRUNE, !self.no_prune);
        passes
    }
}
