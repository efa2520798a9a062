//! Line-oriented shell around the todo core.
//!
//! Loads an optional JSON export into an in-memory data layer, then reads
//! commands from stdin, turns them into events, runs the resulting actions
//! and prints the view model whenever it changes.
//!
//! ```text
//! todo-core [--config <file.toml>] [export.json]
//! ```
//!
//! # Commands
//!
//! | Command              | Effect                                          |
//! |----------------------|-------------------------------------------------|
//! | `key <chord>`        | Key press, e.g. `key ctrl+a`, `key shift+space` |
//! | `type <text>`        | Types each character into the search box        |
//! | `toggle <id>`        | Checkbox click on an item                       |
//! | `range <id>`         | Shift-click on an item                          |
//! | `move <list id>`     | Moves the selected tasks into a list            |
//! | `tick`               | Advances the clock past the search debounce     |
//! | `wait <ms>`          | Advances the clock, e.g. past a queue backoff   |
//! | `offline` / `online` | Cuts or restores the data layer                 |
//! | `resolve <op> <mine\|server>` | Settles a parked conflict              |
//! | `import <file>`      | Merges an export file                           |
//! | `export` / `stats`   | Prints the export document or the summary       |
//! | `json <request>`     | Sends a raw backend request through the bridge  |
//! | `show`               | Prints the view model                           |
//! | `quit`               | Exits                                           |

#![allow(clippy::multiple_crate_versions)]

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;
use std::time::Duration;

use futures::executor::block_on;
use todo_core::app::{Clock, Command};
use todo_core::backend::{BackendBridge, InMemoryBackend};
use todo_core::domain::{ItemId, OpId};
use todo_core::observability::init_tracing;
use todo_core::reports::{export_json, import_json, summarize};
use todo_core::selection::BulkAction;
use todo_core::storage::{JsonFileStore, LocalStore, MemoryStore};
use todo_core::sync::ConflictChoice;
use todo_core::{initialize, Config, Event, Runtime, TodoError};

struct Args {
    config: Option<PathBuf>,
    data: Option<PathBuf>,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args { config: None, data: None };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                args.config = Some(iter.next().ok_or("--config needs a path")?.into());
            }
            "--help" | "-h" => return Err("usage: todo-core [--config <file.toml>] [export.json]".into()),
            _ if args.data.is_none() => args.data = Some(arg.into()),
            _ => return Err(format!("unexpected argument: {arg}")),
        }
    }
    Ok(args)
}

/// Shell state: the runtime plus a virtual clock driving debounce.
struct Shell {
    runtime: Runtime<InMemoryBackend>,
    backend: Rc<InMemoryBackend>,
    clock: Clock,
    tick_step: Duration,
}

impl Shell {
    fn new(config: &Config, backend: Rc<InMemoryBackend>, store: Box<dyn LocalStore>) -> Result<Self, TodoError> {
        let state = initialize(config, store.as_ref())?;
        Ok(Self {
            runtime: Runtime::new(state, Rc::clone(&backend), store),
            backend,
            clock: Clock::now(),
            tick_step: config.search.debounce() + Duration::from_millis(1),
        })
    }

    fn dispatch(&mut self, event: Event) -> bool {
        block_on(self.runtime.dispatch(event, self.clock))
    }

    fn show(&self) {
        println!("{}", self.runtime.viewmodel());
    }

    /// Runs one command line. Returns `false` to stop.
    fn execute(&mut self, line: &str) -> Result<bool, TodoError> {
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();

        let render = match command {
            "" => false,
            "quit" | "exit" => return Ok(false),
            "show" => true,
            "key" => self.dispatch(Event::Key(rest.parse()?)),
            "type" => {
                let mut render = false;
                for c in rest.chars() {
                    render |= self.dispatch(Event::Char(c));
                }
                render
            }
            "toggle" => self.dispatch(Event::ToggleItem(rest.into())),
            "range" => self.dispatch(Event::RangeSelect(rest.into())),
            "move" => self.dispatch(Event::Command(Command::Bulk(BulkAction::MoveTo {
                list_id: ItemId::new(rest),
            }))),
            "tick" => {
                self.clock = self.clock.advanced(self.tick_step);
                self.dispatch(Event::Tick)
            }
            "wait" => {
                let Ok(millis) = rest.parse::<u64>() else {
                    println!("expected milliseconds, got `{rest}`");
                    return Ok(true);
                };
                self.clock = self.clock.advanced(Duration::from_millis(millis));
                self.dispatch(Event::Tick)
            }
            "offline" | "online" => {
                let online = command == "online";
                self.backend.set_reachable(online);
                self.dispatch(Event::ConnectivityChanged { online })
            }
            "resolve" => {
                let (op_id, side) = rest.split_once(' ').unwrap_or((rest, ""));
                let choice = match side.trim() {
                    "mine" => ConflictChoice::KeepMine,
                    "server" => ConflictChoice::KeepServer,
                    other => {
                        println!("expected `mine` or `server`, got `{other}`");
                        return Ok(true);
                    }
                };
                self.dispatch(Event::ResolveConflict {
                    op_id: OpId::from(op_id),
                    choice,
                })
            }
            "import" => {
                let payload = std::fs::read_to_string(rest)?;
                self.dispatch(Event::Import { payload })
            }
            "export" => {
                let state = self.runtime.state();
                println!("{}", export_json(&state.lists, &state.tasks, self.clock.wall)?);
                false
            }
            "stats" => {
                let state = self.runtime.state();
                let summary = summarize(&state.lists, &state.tasks, self.clock.wall);
                println!("{}", serde_json::to_string_pretty(&summary)?);
                false
            }
            "json" => {
                let bridge = BackendBridge::new(Rc::clone(&self.backend));
                println!("{}", block_on(bridge.handle_json(rest)));
                false
            }
            other => {
                println!("unknown command: {other}");
                false
            }
        };

        if render {
            self.show();
        }
        Ok(self.runtime.is_running())
    }
}

fn open_store(config: &Config) -> Box<dyn LocalStore> {
    match JsonFileStore::open(config.store_path()) {
        Ok(store) => Box::new(store),
        Err(e) => {
            tracing::warn!(error = %e, "local store unavailable, keeping state in memory");
            Box::new(MemoryStore::new())
        }
    }
}

fn run(args: Args) -> Result<(), TodoError> {
    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    init_tracing(&config);
    tracing::info!(data_dir = %config.data_dir().display(), "starting todo-core shell");

    let backend = match &args.data {
        Some(path) => {
            let document = import_json(&std::fs::read_to_string(path)?)?;
            InMemoryBackend::with_data(document.lists, document.tasks)
        }
        None => InMemoryBackend::new(),
    };
    let backend = Rc::new(backend);

    let store = open_store(&config);
    let mut shell = Shell::new(&config, backend, store)?;

    block_on(shell.runtime.start());
    shell.show();

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        match shell.execute(line.trim()) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => println!("error: {e}"),
        }
        io::stdout().flush()?;
    }

    if shell.runtime.is_running() {
        block_on(shell.runtime.dispatch(Event::Command(Command::Quit), shell.clock));
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = match parse_args() {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{message}");
            return ExitCode::from(2);
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("todo-core: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use todo_core::domain::{Task, TodoList};

    fn shell() -> Shell {
        let now = chrono::Utc::now();
        let backend = InMemoryBackend::with_data(
            vec![TodoList::new("home", "Home", now), TodoList::new("work", "Work", now)],
            vec![Task::new("t1", "home", "Print slides", now), Task::new("t2", "home", "Buy milk", now)],
        );
        let mut shell = Shell::new(&Config::default(), Rc::new(backend), Box::new(MemoryStore::new())).unwrap();
        block_on(shell.runtime.start());
        shell
    }

    #[test]
    fn move_sends_selected_tasks_to_a_list() {
        let mut shell = shell();
        assert!(shell.execute("toggle t1").unwrap());
        assert!(shell.execute("move work").unwrap());

        let moved = shell.backend.task(&ItemId::new("t1")).unwrap();
        assert_eq!(moved.list_id.as_str(), "work");
        assert_eq!(shell.backend.task(&ItemId::new("t2")).unwrap().list_id.as_str(), "home");
    }

    #[test]
    fn wait_drives_queue_backoff() {
        let mut shell = shell();
        shell.execute("offline").unwrap();
        shell.execute("toggle t2").unwrap();
        shell.execute("key c").unwrap();
        assert_eq!(shell.runtime.state().queue.len(), 1);

        // Reported back online while the data layer is still down.
        shell.dispatch(Event::ConnectivityChanged { online: true });
        assert_eq!(shell.runtime.state().queue.pending().next().unwrap().attempts, 1);

        shell.backend.set_reachable(true);
        shell.execute("wait 100").unwrap();
        assert_eq!(shell.runtime.state().queue.len(), 1);
        shell.execute("wait 1000").unwrap();
        assert!(shell.runtime.state().queue.is_empty());
        assert!(shell.backend.task(&ItemId::new("t2")).unwrap().completed);
    }
}
