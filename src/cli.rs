use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "rubyblocks-rs",
    about = "Translate Scratch block projects to Ruby source and parsed Ruby back to blocks."
)]
pub struct Args {
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    #[arg(value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    #[arg(
        long,
        conflicts_with = "to_blocks",
        help = "Treat INPUT as a project (.sb3 or project.json) and emit Ruby."
    )]
    pub to_ruby: bool,

    #[arg(long, help = "Treat INPUT as a parsed Ruby tree (.ast.json) and emit project JSON.")]
    pub to_blocks: bool,

    #[arg(
        long,
        value_name = "NAME",
        help = "Sprite to emit (to Ruby) or to name in the generated project (to blocks)."
    )]
    pub target: Option<String>,

    #[arg(short, long, help = "Log every dispatched rule to stderr.")]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    ToRuby,
    ToBlocks,
}

impl Args {
    /// Forced mode, else `.ast.json` inputs go to blocks and everything else to Ruby.
    pub fn mode(&self) -> Mode {
        if self.to_ruby {
            return Mode::ToRuby;
        }
        if self.to_blocks {
            return Mode::ToBlocks;
        }
        let is_ast = self
            .input
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.to_ascii_lowercase().ends_with(".ast.json"))
            .unwrap_or(false);
        if is_ast {
            Mode::ToBlocks
        } else {
            Mode::ToRuby
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_follows_extension_unless_forced() {
        let args = Args::parse_from(["rubyblocks-rs", "program.ast.json"]);
        assert_eq!(args.mode(), Mode::ToBlocks);
        let args = Args::parse_from(["rubyblocks-rs", "game.sb3"]);
        assert_eq!(args.mode(), Mode::ToRuby);
        let args = Args::parse_from(["rubyblocks-rs", "tree.json", "--to-blocks"]);
        assert_eq!(args.mode(), Mode::ToBlocks);
    }

    #[test]
    fn forced_modes_conflict() {
        assert!(Args::try_parse_from(["rubyblocks-rs", "x.json", "--to-ruby", "--to-blocks"]).is_err());
    }
}
