use anyhow::{anyhow, Context};
use rustyline::Editor;
use std::{fs, path::Path, process};
use toalc::{Args, Compiler, Stage};

fn main() {
    env_logger::init();
    let args = Args::new();
    let compiler = Compiler::new(args.passes());
    let result = match &args.file_name {
        Some(file_name) => run_file(&compiler, file_name, args.output),
        None => {
            run_prompt(&compiler, args.output);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{:#}", e);
        process::exit(1);
    }
}

fn run_file(compiler: &Compiler, file_name: &Path, stage: Stage) -> anyhow::Result<()> {
    let source = fs::read_to_string(file_name)
        .with_context(|| format!("could not read {}", file_name.display()))?;
    match compiler.compile(&source, stage) {
        Ok(out) => {
            println!("{}", out);
            Ok(())
        }
        Err(e) => Err(anyhow!("{}", Compiler::render_error(&source, &e))),
    }
}

fn run_prompt(compiler: &Compiler, stage: Stage) {
    let mut editor = Editor::<()>::new();
    while let Ok(line) = editor.readline("$ ") {
        editor.add_history_entry(line.as_str());
        match compiler.compile(&line, stage) {
            Ok(out) => println!("{}", out),
            Err(e) => eprintln!("{}", Compiler::render_error(&line, &e)),
        }
    }
}
