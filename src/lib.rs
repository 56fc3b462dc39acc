pub mod blocks;
pub mod error;
pub mod guidance;
pub mod project;
pub mod ruby_ast;
pub mod ruby_generator;
pub mod ruby_to_blocks;

#[cfg(not(target_arch = "wasm32"))]
pub mod cli;

use anyhow::{anyhow, Context, Result};
use blocks::BlockGraph;
use ruby_ast::Node;
use ruby_generator::RubyGenerator;
use ruby_to_blocks::{Conversion, RubyToBlocksConverter};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

#[cfg(all(target_arch = "wasm32", feature = "wasm-bindings"))]
pub mod wasm;

/// Sprite name used when the caller does not pick one.
pub const DEFAULT_TARGET: &str = "Sprite1";

/// Ruby source for every script in `graph`.
pub fn blocks_to_ruby(graph: &BlockGraph) -> String {
    RubyGenerator::new(graph).workspace_to_code()
}

/// Converts a parsed Ruby program for the sprite `target`.
pub fn ruby_ast_to_blocks(nodes: &[Node], target: &str) -> Conversion {
    RubyToBlocksConverter::new(target).convert_program(nodes)
}

/// Ruby source for a `blocks` object in `project.json` encoding.
pub fn blocks_json_to_ruby(blocks_json: &str) -> Result<String> {
    let value: Value = serde_json::from_str(blocks_json).context("Blocks input is not valid JSON.")?;
    let graph = BlockGraph::from_json(&value)?;
    Ok(blocks_to_ruby(&graph))
}

/// Project JSON for a serialized Ruby tree.
pub fn ruby_ast_json_to_blocks_json(ast_json: &str, target: &str) -> Result<String> {
    let nodes: Vec<Node> = serde_json::from_str(ast_json).context("Ruby tree is not valid JSON.")?;
    let conversion = ruby_ast_to_blocks(&nodes, target);
    Ok(project::project_json_for(&conversion.target, &conversion.graph).to_string())
}

/// `{"add": blocks, "delete": blocks}` for a help entry's `nextSteps`.
pub fn guidance_json_to_blocks_json(next_steps_json: &str) -> Result<String> {
    let steps: guidance::NextSteps =
        serde_json::from_str(next_steps_json).context("Next steps are not valid JSON.")?;
    let guidance = guidance::build_guidance(&steps)?;
    Ok(json!({
        "add": guidance.add.to_json(),
        "delete": guidance.delete.to_json()
    })
    .to_string())
}

#[cfg(not(target_arch = "wasm32"))]
pub fn run_cli(args: &cli::Args) -> Result<()> {
    match args.mode() {
        cli::Mode::ToRuby => project_to_ruby(args),
        cli::Mode::ToBlocks => ruby_to_project(args),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn project_to_ruby(args: &cli::Args) -> Result<()> {
    let progress = CliProgress::new("To Ruby", 3);
    progress.emit(1, "Resolving input path");
    let input = canonicalize_file(&args.input)?;

    progress.emit(2, "Reading project");
    let targets = project::read_project(&input)?;

    progress.emit(3, "Generating Ruby");
    let source = match &args.target {
        Some(name) => {
            let target = targets
                .iter()
                .find(|t| &t.name == name)
                .ok_or_else(|| anyhow!("Target '{}' not found in '{}'.", name, input.display()))?;
            blocks_to_ruby(&target.graph)
        }
        None => targets
            .iter()
            .filter(|t| !t.graph.is_empty())
            .map(|t| format!("# {}\n{}", t.name, blocks_to_ruby(&t.graph)))
            .collect::<Vec<_>>()
            .join("\n"),
    };
    write_output(args.output.as_deref(), &source)
}

#[cfg(not(target_arch = "wasm32"))]
fn ruby_to_project(args: &cli::Args) -> Result<()> {
    let progress = CliProgress::new("To blocks", 3);
    progress.emit(1, "Resolving input path");
    let input = canonicalize_file(&args.input)?;

    progress.emit(2, "Reading Ruby tree");
    let raw = std::fs::read_to_string(&input)
        .with_context(|| format!("Failed to read '{}'.", input.display()))?;
    let nodes: Vec<Node> = serde_json::from_str(&raw)
        .with_context(|| format!("'{}' is not a valid Ruby tree.", input.display()))?;

    progress.emit(3, "Converting statements");
    let conversion = ruby_ast_to_blocks(&nodes, args.target.as_deref().unwrap_or(DEFAULT_TARGET));
    if !nodes.is_empty() && conversion.converted().next().is_none() {
        anyhow::bail!("None of the {} statements in '{}' could be converted.", nodes.len(), input.display());
    }
    let project = project::project_json_for(&conversion.target, &conversion.graph);
    let mut text = serde_json::to_string_pretty(&project)?;
    text.push('\n');
    write_output(args.output.as_deref(), &text)
}

#[cfg(not(target_arch = "wasm32"))]
fn write_output(output: Option<&Path>, text: &str) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, text)
            .with_context(|| format!("Failed to write '{}'.", path.display())),
        None => {
            print!("{}", text);
            Ok(())
        }
    }
}

pub fn canonicalize_file(path: &Path) -> Result<PathBuf> {
    if !path.exists() || !path.is_file() {
        return Err(anyhow!("Input file not found: '{}'.", path.display()));
    }
    Ok(path.canonicalize()?)
}

#[cfg(not(target_arch = "wasm32"))]
struct CliProgress {
    prefix: &'static str,
    total: usize,
}

#[cfg(not(target_arch = "wasm32"))]
impl CliProgress {
    fn new(prefix: &'static str, total: usize) -> Self {
        Self {
            prefix,
            total: total.max(1),
        }
    }

    fn emit(&self, step: usize, label: &str) {
        let step = step.clamp(1, self.total);
        tracing::info!("[{}] {}... ({}/{})", self.prefix, label, step, self.total);
    }
}
