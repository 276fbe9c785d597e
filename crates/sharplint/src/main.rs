use anyhow::Context;
use camino::Utf8PathBuf;
use clap::Parser;
use sharplint_errors::Renderer;
use sharplint_inputs::SourceFile;
use sharplint_lexer::Definitions;
use sharplint_tree::{Document, NodeId};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
enum Options {
    /// Parse a source file and report the first syntax error, if any.
    Check {
        path: Utf8PathBuf,
        /// Preprocessor symbol treated as defined. May be repeated.
        #[arg(long = "define", value_name = "SYMBOL")]
        defines: Vec<String>,
        /// Print the full code unit tree on success.
        #[arg(long)]
        dump: bool,
    },
}

fn main() -> anyhow::Result<()> {
    match Options::parse() {
        Options::Check { path, defines, dump } => check(path, defines, dump),
    }
}

fn check(path: Utf8PathBuf, defines: Vec<String>, dump: bool) -> anyhow::Result<()> {
    let text =
        std::fs::read_to_string(&path).with_context(|| format!("failed to read `{path}`"))?;
    let file = SourceFile::new(path, text);
    let definitions: Definitions = defines.into_iter().collect();

    match sharplint_parse::parse(file.text(), file.path().as_str(), &definitions) {
        Ok(document) => {
            if dump {
                print!("{}", document.debug_tree());
            } else {
                println!(
                    "{}: {} elements, no syntax errors",
                    document.name(),
                    element_count(&document)
                );
            }
            Ok(())
        }
        Err(error) => {
            let renderer = Renderer::styled();
            let position = file.line_index().line_col(error.range().start());
            eprintln!("{}:{}:{}: {error}", file.path(), position.line + 1, position.col + 1);
            eprintln!("{}", error.render(&renderer, file.path().as_str(), file.text()));
            std::process::exit(1);
        }
    }
}

/// Elements in the document, the root excluded.
fn element_count(document: &Document) -> usize {
    fn count(document: &Document, node: NodeId) -> usize {
        usize::from(document.tree().is_element(node))
            + document.tree().children(node).map(|child| count(document, child)).sum::<usize>()
    }

    count(document, document.root()) - 1
}
