use super::super::args::*;

pub fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Merge(args) => super::merge::run(args),
        Command::Inspect(args) => super::inspect::run(args),
    }
}
