//! Build script rendering man pages for `framerelay` and its subcommands.

use std::{fs, io, path::Path};

use clap::CommandFactory;
use clap_mangen::Man;

#[path = "src/cli.rs"]
mod cli;

const MAN_DIR: &str = "target/generated-man";

fn render(cmd: clap::Command, dir: &Path, name: &str) -> io::Result<()> {
    let mut page = Vec::new();
    Man::new(cmd).title(name).render(&mut page)?;
    fs::write(dir.join(format!("{name}.1")), page)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=src/cli.rs");

    let dir = Path::new(MAN_DIR);
    fs::create_dir_all(dir)?;

    let cmd = cli::Cli::command();
    for sub in cmd.get_subcommands() {
        let name = format!("framerelay-{}", sub.get_name());
        render(sub.clone(), dir, &name)?;
    }
    render(cmd, dir, "framerelay")?;

    Ok(())
}
