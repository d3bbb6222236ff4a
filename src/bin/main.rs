use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use reactive_trees::{Forest, Key, Kind, Order};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "reactive-trees")]
#[command(about = "Interactive BST, AVL and red-black trees persisted as preorder text.", long_about = None)]
struct Args {
    /// Directory holding bst.txt, avl.txt and rb.txt.
    #[arg(long, env = "REACTIVE_TREES_DIR", default_value = ".")]
    data_dir: PathBuf,
    /// Start on this tree instead of the selection menu.
    #[arg(long, value_enum)]
    tree: Option<TreeArg>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum TreeArg {
    Bst,
    Avl,
    Rb,
}

impl From<TreeArg> for Kind {
    fn from(arg: TreeArg) -> Kind {
        match arg {
            TreeArg::Bst => Kind::Unbalanced,
            TreeArg::Avl => Kind::Avl,
            TreeArg::Rb => Kind::RedBlack,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let mut forest = Forest::new();
    for err in forest.load_all(&args.data_dir) {
        let err = anyhow::Error::from(err);
        tracing::warn!("{err:#}; starting with an empty tree");
    }

    let stdin = io::stdin();
    let mut console = Console {
        forest,
        data_dir: args.data_dir,
        input: stdin.lock(),
        out: io::stdout().lock(),
    };
    console.run(args.tree.map(Kind::from))
}

/// What to do after leaving the operation menu.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Next {
    SelectTree,
    Exit,
}

struct Console<R, W> {
    forest: Forest,
    data_dir: PathBuf,
    input: R,
    out: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    fn run(&mut self, mut initial: Option<Kind>) -> Result<()> {
        loop {
            let kind = match initial.take() {
                Some(kind) => kind,
                None => match self.select_tree()? {
                    Some(kind) => kind,
                    None => break,
                },
            };

            self.forest.select(kind);
            if self.operations()? == Next::Exit {
                break;
            }
        }

        writeln!(self.out, "Exiting program.")?;
        Ok(())
    }

    /// Returns `None` when the user asks to exit or input ends.
    fn select_tree(&mut self) -> Result<Option<Kind>> {
        writeln!(self.out, "=============================")?;
        writeln!(self.out, " Welcome to Reactive Trees!  ")?;
        writeln!(self.out, "=============================")?;
        writeln!(self.out, "Select a tree type:")?;
        writeln!(self.out, "1. Binary Search Tree (BST)")?;
        writeln!(self.out, "2. AVL Tree")?;
        writeln!(self.out, "3. Red-Black Tree")?;
        writeln!(self.out, "4. Exit Program")?;

        let Some(choice) = self.prompt("Enter number: ")? else {
            return Ok(None);
        };

        Ok(match choice.parse::<u32>() {
            Ok(1) => Some(Kind::Unbalanced),
            Ok(2) => Some(Kind::Avl),
            Ok(3) => Some(Kind::RedBlack),
            Ok(4) => None,
            _ => {
                writeln!(self.out, "Invalid choice, defaulting to BST.")?;
                Some(Kind::Unbalanced)
            }
        })
    }

    fn operations(&mut self) -> Result<Next> {
        loop {
            writeln!(self.out, "\n====================")?;
            writeln!(self.out, "{}", self.forest.current_kind().name())?;
            writeln!(self.out, "Select Operation:")?;
            writeln!(self.out, "1. Insert key")?;
            writeln!(self.out, "2. Delete key")?;
            writeln!(self.out, "3. Search key")?;
            writeln!(self.out, "4. Traverse")?;
            writeln!(self.out, "5. Clear Tree")?;
            writeln!(self.out, "6. Back to Tree Selection")?;
            writeln!(self.out, "7. Exit Program")?;

            let Some(choice) = self.prompt("Enter number: ")? else {
                return Ok(Next::Exit);
            };

            match choice.parse::<u32>() {
                Ok(1) => {
                    let Some(key) = self.prompt_key("Enter key to insert: ")? else {
                        continue;
                    };
                    if !self.forest.insert(key) {
                        writeln!(self.out, "Key {key} already present.")?;
                    }
                    self.commit()?;
                }
                Ok(2) => {
                    let Some(key) = self.prompt_key("Enter key to delete: ")? else {
                        continue;
                    };
                    if !self.forest.remove(key) {
                        writeln!(self.out, "Key {key} not found.")?;
                    }
                    self.commit()?;
                }
                Ok(3) => {
                    let Some(key) = self.prompt_key("Enter key to search: ")? else {
                        continue;
                    };
                    let result = self.forest.search(key);
                    if result.found {
                        writeln!(self.out, "Found at depth: {}", result.depth)?;
                    } else {
                        writeln!(self.out, "Not found")?;
                    }
                }
                Ok(4) => self.traverse()?,
                Ok(5) => {
                    self.forest.clear();
                    self.save()?;
                    let name = match self.forest.current_kind() {
                        Kind::Unbalanced => "BST",
                        kind => kind.name(),
                    };
                    writeln!(self.out, "{name} cleared from memory and file.")?;
                }
                Ok(6) => return Ok(Next::SelectTree),
                Ok(7) => return Ok(Next::Exit),
                _ => writeln!(self.out, "Invalid option.")?,
            }
        }
    }

    fn traverse(&mut self) -> Result<()> {
        writeln!(self.out, "\n====================")?;
        writeln!(self.out, "Select Traversal Type:")?;
        writeln!(self.out, "1. Preorder")?;
        writeln!(self.out, "2. Inorder")?;
        writeln!(self.out, "3. Postorder")?;
        writeln!(self.out, "4. All Three Orders")?;

        let Some(choice) = self.prompt("Enter number: ")? else {
            return Ok(());
        };

        let orders: &[Order] = match choice.parse::<u32>() {
            Ok(1) => &[Order::Pre],
            Ok(2) => &[Order::In],
            Ok(3) => &[Order::Post],
            Ok(4) => &Order::ALL,
            _ => {
                writeln!(self.out, "Invalid option.")?;
                return Ok(());
            }
        };

        for &order in orders {
            write!(self.out, "{}: ", order.label())?;
            for key in self.forest.keys(order) {
                write!(self.out, "{key} ")?;
            }
            writeln!(self.out)?;
        }
        Ok(())
    }

    /// Saves the current tree and shows its new layout.
    fn commit(&mut self) -> Result<()> {
        self.save()?;
        write!(self.out, "{}", self.forest.layout())?;
        Ok(())
    }

    fn save(&mut self) -> Result<()> {
        if let Err(err) = self.forest.save(&self.data_dir, self.forest.current_kind()) {
            let err = anyhow::Error::from(err);
            tracing::error!("{err:#}");
            writeln!(self.out, "Could not save: {err:#}")?;
        }
        Ok(())
    }

    /// Prints `text` and reads one trimmed line. Returns `None` at end of input.
    fn prompt(&mut self, text: &str) -> Result<Option<String>> {
        write!(self.out, "{text}")?;
        self.out.flush().context("failed to flush stdout")?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .context("failed to read from stdin")?;

        if read == 0 {
            writeln!(self.out)?;
            return Ok(None);
        }
        Ok(Some(line.trim().to_owned()))
    }

    /// Like [`prompt`](Self::prompt), but parses a key. Invalid input is reported and yields
    /// `None`.
    fn prompt_key(&mut self, text: &str) -> Result<Option<Key>> {
        let Some(line) = self.prompt(text)? else {
            return Ok(None);
        };

        match line.parse() {
            Ok(key) => Ok(Some(key)),
            Err(_) => {
                writeln!(self.out, "Invalid key: {line:?}")?;
                Ok(None)
            }
        }
    }
}
