//! CLI argument surface (spec.md §6: "minimal surface — read a single file
//! path").

use std::fs::read_to_string;
use std::path::PathBuf;

use structopt::StructOpt;

#[derive(StructOpt, Debug)]
#[structopt(
    name = "formality-core",
    about = "Checker for a minimal dependently-typed lambda calculus with a self-referencing dependent function former",
    author = "ammkrn"
)]
pub struct Opt {
    #[structopt(short = "d", long = "debug")]
    pub debug: bool,

    /// The source file to check.
    #[structopt(name = "FILE", parse(from_os_str))]
    file: PathBuf,
}

impl Opt {
    pub fn try_read_file(&self) -> Result<String, std::io::Error> {
        read_to_string(&self.file)
    }

    pub fn file_name(&self) -> String {
        self.file.display().to_string()
    }
}
