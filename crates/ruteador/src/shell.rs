//! Line-oriented front end for a [`RouteSession`].
//!
//! Each input line is one operator event (a marker click, a reorder, a
//! save, ...). The shell applies it, prints the result and keeps going;
//! errors are reported and leave the session usable.

use crate::csv_reader::read_saved_route_csv;
use crate::error::{Result, RouteError};
use crate::export::{RouteStore, find_saved_route, list_saved_routes};
use crate::model::Coordinate;
use crate::session::{RouteSession, ToggleOutcome};
use chrono::Local;
use log::{info, warn};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

const HELP: &str = "\
Commands:
  markers              list markers (* = in the route)
  click <lat> <lng>    add the marker at this coordinate, or remove it
  move <pos> <label>   move a selected stop to a 1-based position
  apply                draw the current selection as the route line
  show                 print the current route
  save <route_id>      write ruta_<route_id>.csv and drop its teams
  routes               list saved routes
  open <route_id|path> load a saved route for viewing
  help                 this text
  quit                 leave";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Markers,
    Click(Coordinate),
    Move { position: usize, label: String },
    Apply,
    Show,
    Save(String),
    Routes,
    Open(String),
    Quit,
}

impl Command {
    /// Parses one input line. Blank lines and `#` comments yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };

        let command = match name.to_ascii_lowercase().as_str() {
            "help" | "?" => Command::Help,
            "markers" => Command::Markers,
            "click" => Command::Click(parse_coordinate(rest)?),
            "move" => {
                let (position, label) = rest
                    .split_once(char::is_whitespace)
                    .ok_or_else(|| usage("move <pos> <label>"))?;
                let position = position
                    .parse()
                    .map_err(|_| RouteError::InvalidCommand(format!("bad position '{position}'")))?;
                Command::Move {
                    position,
                    label: label.trim().to_string(),
                }
            }
            "apply" => Command::Apply,
            "show" => Command::Show,
            "save" => Command::Save(rest.to_string()),
            "routes" => Command::Routes,
            "open" if !rest.is_empty() => Command::Open(rest.to_string()),
            "open" => return Err(usage("open <route_id|path>")),
            "quit" | "exit" => Command::Quit,
            other => {
                return Err(RouteError::InvalidCommand(format!(
                    "unknown command '{other}' (try 'help')"
                )));
            }
        };
        Ok(Some(command))
    }
}

fn usage(form: &str) -> RouteError {
    RouteError::InvalidCommand(format!("usage: {form}"))
}

/// Accepts `lat lng` or `lat,lng`.
fn parse_coordinate(args: &str) -> Result<Coordinate> {
    let parts: Vec<&str> = args
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect();
    let [lat, lng] = parts.as_slice() else {
        return Err(usage("click <lat> <lng>"));
    };

    let parse = |v: &str| {
        v.parse::<f64>()
            .map_err(|_| RouteError::InvalidCommand(format!("bad coordinate '{v}'")))
    };
    Coordinate::new(parse(*lat)?, parse(*lng)?)
        .ok_or_else(|| RouteError::InvalidCommand(format!("bad coordinate '{args}'")))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Shell<S: RouteStore> {
    session: RouteSession,
    store: S,
    routes_dir: PathBuf,
}

impl<S: RouteStore> Shell<S> {
    pub fn new(session: RouteSession, store: S, routes_dir: impl Into<PathBuf>) -> Self {
        Self {
            session,
            store,
            routes_dir: routes_dir.into(),
        }
    }

    pub fn session(&self) -> &RouteSession {
        &self.session
    }

    /// Runs until `quit` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> Result<()> {
        for line in input.lines() {
            let line = line?;
            match self.execute(&line, out) {
                Ok(Flow::Quit) => break,
                Ok(Flow::Continue) => {}
                Err(e) => {
                    if !e.is_validation() {
                        warn!("{line}: {e}");
                    }
                    writeln!(out, "error: {e}")?;
                }
            }
        }
        out.flush()?;
        Ok(())
    }

    pub fn execute<W: Write>(&mut self, line: &str, out: &mut W) -> Result<Flow> {
        let Some(command) = Command::parse(line)? else {
            return Ok(Flow::Continue);
        };

        match command {
            Command::Help => writeln!(out, "{HELP}")?,
            Command::Markers => self.print_markers(out)?,
            Command::Click(coordinate) => match self.session.toggle(coordinate) {
                ToggleOutcome::Added(position) => {
                    let label = &self.session.selection()[position - 1].label;
                    writeln!(out, "+ {position}. {label}")?;
                }
                ToggleOutcome::Removed(position) => writeln!(out, "- removed stop {position}")?,
                ToggleOutcome::Ignored => writeln!(out, "no marker at {coordinate}")?,
            },
            Command::Move { position, label } => {
                self.session.reorder(&label, position)?;
                writeln!(out, "moved {label} to {position}")?;
            }
            Command::Apply => {
                if self.session.commit_draft() {
                    writeln!(out, "route line: {} stops", self.session.selection().len())?;
                } else {
                    writeln!(out, "select at least 2 stops to draw the route")?;
                }
            }
            Command::Show => self.print_route(out)?,
            Command::Save(route_id) => {
                let (route, path) = self.session.save_to(&route_id, &mut self.store)?;
                info!(
                    "Route {} saved at {}",
                    route.route_id,
                    Local::now().format("%Y-%m-%d %H:%M:%S")
                );
                writeln!(
                    out,
                    "saved route {} ({} stops, {} teams) to {}",
                    route.route_id,
                    route.stop_count(),
                    route.teams().len(),
                    path.display()
                )?;
                writeln!(
                    out,
                    "{} records left in {} markers",
                    self.session.records().len(),
                    self.session.markers().len()
                )?;
            }
            Command::Routes => {
                let routes = list_saved_routes(&self.routes_dir)?;
                if routes.is_empty() {
                    writeln!(out, "no saved routes in {}", self.routes_dir.display())?;
                }
                for route in routes {
                    let modified = route
                        .modified
                        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_default();
                    writeln!(out, "{:<12} {}  {}", route.route_id, modified, route.path.display())?;
                }
            }
            Command::Open(target) => {
                let path = self.resolve_route_path(&target)?;
                let route = read_saved_route_csv(&path)?;
                self.session.load_saved(&route);
                writeln!(
                    out,
                    "opened route {} ({} stops)",
                    route.route_id,
                    self.session.selection().len()
                )?;
            }
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    fn resolve_route_path(&self, target: &str) -> Result<PathBuf> {
        let as_path = Path::new(target);
        if as_path.is_file() {
            return Ok(as_path.to_path_buf());
        }
        find_saved_route(&self.routes_dir, target)
            .ok_or_else(|| RouteError::RouteNotFound(target.to_string()))
    }

    fn print_markers<W: Write>(&self, out: &mut W) -> Result<()> {
        let markers = self.session.markers();
        writeln!(out, "{} markers", markers.len())?;
        for (coordinate, label) in markers.iter() {
            let mark = if self.session.is_selected(*coordinate) { " *" } else { "" };
            writeln!(out, "  {coordinate}  {label}{mark}")?;
        }
        Ok(())
    }

    fn print_route<W: Write>(&self, out: &mut W) -> Result<()> {
        let selection = self.session.selection();
        if selection.is_empty() {
            writeln!(out, "no stops selected")?;
        }
        for (i, entry) in selection.iter().enumerate() {
            writeln!(out, "{}. {}  ({})", i + 1, entry.label, entry.coordinate)?;
        }
        match self.session.drawn_route() {
            Some(line) => writeln!(out, "route line: {} stops", line.len())?,
            None => writeln!(out, "route line: not drawn")?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::CsvRouteStore;
    use crate::model::WalkerRecord;
    use tempfile::TempDir;

    fn shell_in(dir: &Path) -> Shell<CsvRouteStore> {
        let session = RouteSession::load(vec![
            WalkerRecord::new("T1", 1.0, 1.0),
            WalkerRecord::new("T2", 1.0, 1.0),
            WalkerRecord::new("T3", 2.0, 2.0),
            WalkerRecord::new("T4", 3.0, 3.0),
        ]);
        Shell::new(session, CsvRouteStore::new(dir), dir)
    }

    fn run_script(shell: &mut Shell<CsvRouteStore>, script: &str) -> String {
        let mut out = Vec::new();
        shell.run(script.as_bytes(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("  ").unwrap(), None);
        assert_eq!(Command::parse("# note").unwrap(), None);
        assert_eq!(
            Command::parse("click -34.6 -58.4").unwrap(),
            Some(Command::Click(Coordinate::new(-34.6, -58.4).unwrap()))
        );
        assert_eq!(
            Command::parse("CLICK 1.5,2").unwrap(),
            Some(Command::Click(Coordinate::new(1.5, 2.0).unwrap()))
        );
        assert_eq!(
            Command::parse("move 2 T1, T2").unwrap(),
            Some(Command::Move {
                position: 2,
                label: "T1, T2".to_string()
            })
        );
        assert_eq!(Command::parse("save").unwrap(), Some(Command::Save(String::new())));
        assert_eq!(Command::parse("exit").unwrap(), Some(Command::Quit));
    }

    #[test]
    fn test_parse_errors() {
        let lines = [
            "click 1",
            "click a b",
            "click nan 1",
            "move x T1",
            "move 2",
            "open",
            "fly",
        ];
        for line in lines {
            let err = Command::parse(line).unwrap_err();
            assert!(err.is_validation(), "{line}: {err}");
        }
    }

    #[test]
    fn test_build_and_save_route() {
        let temp_dir = TempDir::new().unwrap();
        let mut shell = shell_in(temp_dir.path());

        let output = run_script(
            &mut shell,
            "click 1 1\nclick 2 2\nclick 9 9\nmove 1 T3\napply\nsave 5\nshow\n",
        );

        assert!(output.contains("+ 1. T1, T2"));
        assert!(output.contains("+ 2. T3"));
        assert!(output.contains("no marker at 9 9"));
        assert!(output.contains("moved T3 to 1"));
        assert!(output.contains("route line: 2 stops"));
        assert!(output.contains("saved route 5 (2 stops, 3 teams)"));
        assert!(output.contains("1 records left in 1 markers"));
        assert!(output.contains("no stops selected"));

        let content = std::fs::read_to_string(temp_dir.path().join("ruta_5.csv")).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Ruta,Orden,Equipo,Latitud,Longitud",
                "5,1,T3,2.0,2.0",
                "5,2,T1,1.0,1.0",
                "5,2,T2,1.0,1.0",
            ]
        );
    }

    #[test]
    fn test_errors_keep_shell_running() {
        let temp_dir = TempDir::new().unwrap();
        let mut shell = shell_in(temp_dir.path());

        let output = run_script(
            &mut shell,
            "save 1\nclick 3 3\nsave   \nmove 4 T4\nmove 1 T9\nbogus\nshow\n",
        );

        assert!(output.contains("error: No stops selected"));
        assert!(output.contains("error: Route id must not be empty"));
        assert!(output.contains("error: Invalid position 4: must be between 1 and 1"));
        assert!(output.contains("error: Not in the current route: T9"));
        assert!(output.contains("error: Invalid command: unknown command 'bogus'"));
        assert!(output.contains("1. T4"));
        assert_eq!(shell.session().records().len(), 4);
    }

    #[test]
    fn test_quit_stops_processing() {
        let temp_dir = TempDir::new().unwrap();
        let mut shell = shell_in(temp_dir.path());

        run_script(&mut shell, "click 1 1\nquit\nclick 2 2\n");
        assert_eq!(shell.session().selected_labels(), vec!["T1, T2"]);
    }

    #[test]
    fn test_routes_and_open() {
        let temp_dir = TempDir::new().unwrap();
        let mut shell = shell_in(temp_dir.path());

        let script = "routes\nclick 3 3\nclick 2 2\nsave 8\nroutes\nopen 8\nshow\nopen 99\n";
        let output = run_script(&mut shell, script);

        assert!(output.contains("no saved routes in"));
        assert!(output.contains("ruta_8.csv"));
        assert!(output.contains("opened route 8 (2 stops)"));
        assert!(output.contains("1. T4"));
        assert!(output.contains("2. T3"));
        assert!(output.contains("route line: 2 stops"));
        assert!(output.contains("error: No saved route 99"));
        assert_eq!(shell.session().records().len(), 2);
    }

    #[test]
    fn test_markers_listing() {
        let temp_dir = TempDir::new().unwrap();
        let mut shell = shell_in(temp_dir.path());

        let output = run_script(&mut shell, "click 2 2\nmarkers\n");
        assert!(output.contains("3 markers"));
        assert!(output.contains("  1 1  T1, T2\n"));
        assert!(output.contains("  2 2  T3 *\n"));
    }
}
