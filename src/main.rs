#![forbid(unsafe_code)]

use structopt::StructOpt;

use formality_core::parser;

use crate::cli::Opt;

pub mod cli;

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimallocator::Mimalloc = mimallocator::Mimalloc;

fn main() {
    let opt = Opt::from_args();

    if opt.debug {
        println!("CLI returned these arguments: {:#?}", opt);
    }

    let source = match opt.try_read_file() {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Checking: {}\ncould not read file: {}", opt.file_name(), e);
            std::process::exit(1);
        }
    };

    let module = match parser::parse_module(&source) {
        Ok(module) => module,
        Err(e) => {
            eprintln!("Checking: {}\n{}", opt.file_name(), e);
            std::process::exit(1);
        }
    };

    let failures = module.check();
    for (name, err) in &failures {
        println!("Checking: {}\n{}", name, err);
    }

    if failures.is_empty() {
        println!("Checked {} definition(s) in {}, all passed.", module.len(), opt.file_name());
        std::process::exit(0);
    } else {
        std::process::exit(1);
    }
}
