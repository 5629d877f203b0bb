use std::io::{self, Write};

use gantt_schedule::{
    AppConfig, BarGesture, BarKind, CalendarSource, JsonFileTaskStore, TaskDraft, TaskField,
    TaskId, TaskListStore, TaskStore, Timeline, dates, load_tasks_from_csv, logging,
    save_tasks_to_csv,
};

const COLUMNS: [&str; 12] = [
    "sel", "id", "type", "theme", "task", "assignee", "start", "end", "days", "actual start",
    "actual end", "%",
];

fn render_tasks_as_text_table(store: &TaskStore) -> String {
    let rows: Vec<Vec<String>> = store
        .tasks()
        .iter()
        .map(|task| {
            let mut row = vec![
                if store.is_selected(task.id) { "*" } else { "" }.to_string(),
                task.id.to_string(),
                task.kind.to_string(),
            ];
            row.extend(
                [
                    TaskField::ThemeName,
                    TaskField::TaskName,
                    TaskField::Assignee,
                    TaskField::StartDate,
                    TaskField::EndDate,
                    TaskField::Duration,
                    TaskField::ActualStartDate,
                    TaskField::ActualEndDate,
                    TaskField::Progress,
                ]
                .into_iter()
                .map(|field| task.field_text(field)),
            );
            row
        })
        .collect();

    let mut widths: Vec<usize> = COLUMNS.iter().map(|name| name.chars().count()).collect();
    for row in &rows {
        for (ci, cell) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(cell.chars().count());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&render_row(&widths, COLUMNS.iter().copied()));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in &rows {
        out.push_str(&render_row(&widths, row.iter().map(String::as_str)));
        out.push('\n');
    }
    out.push_str(&sep);
    out
}

fn render_row<'a>(widths: &[usize], cells: impl Iterator<Item = &'a str>) -> String {
    let mut line = String::from("|");
    for (ci, cell) in cells.enumerate() {
        let pad = widths[ci].saturating_sub(cell.chars().count());
        line.push(' ');
        line.push_str(cell);
        line.push_str(&" ".repeat(pad));
        line.push_str(" |");
    }
    line
}

fn print_help() {
    println!(
        "Commands:\n  help                                  Show this help\n  show                                  Show all rows\n  theme <name...>                       Add a theme row after the selection\n  task <name> [assignee]                Add a task row after the selection\n  set <id> <field> [value...]           Edit one field (empty value clears it)\n  delete <id>                           Delete a row\n  select <id>                           Toggle row selection\n  clear                                 Clear the selection\n  remove-selected                       Delete every selected row\n  move <ids_csv> <index>                Move rows as a block to index\n  bar <id> <planned|actual> <move|resize_start|resize_end> <days>\n                                        Drag or resize a bar on the chart\n  range                                 Show the chart's date range\n  holidays [path]                       Show holiday status or load a file\n  save <json|csv|sqlite> [path]         Persist rows to disk\n  load <json|csv|sqlite> [path]         Replace rows from disk\n  export-csv <path>                     Write rows as CSV\n  quit|exit                             Exit\n\nFields: {}",
        TaskField::ALL
            .iter()
            .map(|field| field.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
}

fn parse_id_list(s: &str) -> Vec<TaskId> {
    s.split(',')
        .filter_map(|p| p.trim().parse::<TaskId>().ok())
        .collect()
}

fn parse_gesture(s: &str) -> Option<BarGesture> {
    match s {
        "move" => Some(BarGesture::Move),
        "resize_start" | "resize-start" => Some(BarGesture::ResizeStart),
        "resize_end" | "resize-end" => Some(BarGesture::ResizeEnd),
        _ => None,
    }
}

fn drag_bar(
    store: &mut TaskStore,
    id: TaskId,
    kind: BarKind,
    gesture: BarGesture,
    delta: i64,
) -> Result<String, String> {
    let task = store
        .get_task(id)
        .ok_or_else(|| format!("Task {id} not found."))?;
    let today = dates::today();
    let timeline = Timeline::for_tasks(store.tasks(), today);
    let span = timeline
        .bars(task, today)
        .into_iter()
        .find(|span| span.kind == kind)
        .ok_or_else(|| format!("Task {id} has no {} bar.", kind.as_str()))?;
    let (start, end) = timeline
        .apply_gesture(&span, gesture, delta)
        .ok_or_else(|| "Bar is outside the chart.".to_string())?;
    let task = store
        .apply_bar_change(id, kind, start, end)
        .map_err(|e| format!("Error: {e}"))?;
    let days = match task.duration {
        Some(days) => format!(" ({days} business days)"),
        None => String::new(),
    };
    Ok(format!(
        "Task {id}: {} bar now {} - {}{days}.",
        kind.as_str(),
        dates::format(start),
        dates::format(end)
    ))
}

fn save_rows(store: &TaskStore, format: &str, path: &str) -> Result<(), String> {
    let result = match format {
        "json" => store.save_to(&JsonFileTaskStore::new(path)),
        "csv" => save_tasks_to_csv(store.tasks(), path),
        #[cfg(feature = "sqlite")]
        "sqlite" => gantt_schedule::SqliteTaskStore::new(path).and_then(|db| store.save_to(&db)),
        other => return Err(format!("Unknown format '{other}'.")),
    };
    result.map_err(|e| format!("Save error: {e}"))
}

fn load_rows(store: &mut TaskStore, format: &str, path: &str) -> Result<usize, String> {
    let loaded = match format {
        "json" => JsonFileTaskStore::new(path).load_tasks(),
        "csv" => load_tasks_from_csv(path).map(Some),
        #[cfg(feature = "sqlite")]
        "sqlite" => gantt_schedule::SqliteTaskStore::new(path).and_then(|db| db.load_tasks()),
        other => return Err(format!("Unknown format '{other}'.")),
    };
    match loaded {
        Ok(Some(tasks)) => store.replace_tasks(tasks).map_err(|e| format!("Load error: {e}")),
        Ok(None) => Err(format!("Nothing saved at {path}.")),
        Err(e) => Err(format!("Load error: {e}")),
    }
}

fn initial_store(config: &AppConfig, calendar: CalendarSource) -> TaskStore {
    let mut store = TaskStore::new(calendar.clone());
    match store.load_from(&JsonFileTaskStore::new(config.data_path.clone())) {
        Ok(true) => store,
        Ok(false) => TaskStore::with_sample_data(calendar),
        Err(e) => {
            tracing::warn!("Ignoring saved rows in {}: {}", config.data_path.display(), e);
            TaskStore::with_sample_data(calendar)
        }
    }
}

fn main() -> anyhow::Result<()> {
    logging::init_tracing("warn");
    let config = AppConfig::load()?;

    let calendar = CalendarSource::weekends_only();
    calendar.load_from_path(&config.holidays_path);
    let mut store = initial_store(&config, calendar);
    let default_path = config.data_path.to_string_lossy().into_owned();

    println!("Gantt schedule (CLI) - type 'help' for commands\n");
    println!("{}", render_tasks_as_text_table(&store));

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        io::stdout().flush()?;
        line.clear();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "show" => println!("{}", render_tasks_as_text_table(&store)),
            "theme" => {
                let name = parts.collect::<Vec<_>>().join(" ");
                let at = store.insert_index();
                match store.add_theme(name, at) {
                    Ok(id) => println!("Added theme {id}."),
                    Err(err) => println!("Error: {err}"),
                }
            }
            "task" => {
                let Some(name) = parts.next() else {
                    println!("Usage: task <name> [assignee]");
                    continue;
                };
                let draft = TaskDraft::new(name).assignee(parts.next().unwrap_or(""));
                let at = store.insert_index();
                match store.add_task(draft, at) {
                    Ok(id) => println!("Added task {id}."),
                    Err(err) => println!("Error: {err}"),
                }
            }
            "set" => {
                let (Some(id_s), Some(field)) = (parts.next(), parts.next()) else {
                    println!("Usage: set <id> <field> [value...]");
                    continue;
                };
                let Ok(id) = id_s.parse::<TaskId>() else {
                    println!("Invalid id");
                    continue;
                };
                let value = parts.collect::<Vec<_>>().join(" ");
                match store.update_field_by_name(id, field, &value) {
                    Ok(task) => println!(
                        "Task {id}: start {} end {} days {}.",
                        task.field_text(TaskField::StartDate),
                        task.field_text(TaskField::EndDate),
                        task.field_text(TaskField::Duration)
                    ),
                    Err(e) => println!("Error: {e}"),
                }
            }
            "delete" => match parts.next().and_then(|s| s.parse::<TaskId>().ok()) {
                Some(id) if store.remove_task(id) => println!("Deleted task {id}."),
                Some(id) => println!("Task {id} not found."),
                None => println!("Usage: delete <id>"),
            },
            "select" => match parts.next().and_then(|s| s.parse::<TaskId>().ok()) {
                Some(id) => {
                    if store.toggle_selection(id) {
                        println!("Selected task {id}.");
                    } else if store.get_task(id).is_some() {
                        println!("Deselected task {id}.");
                    } else {
                        println!("Task {id} not found.");
                    }
                }
                None => println!("Usage: select <id>"),
            },
            "clear" => {
                store.clear_selection();
                println!("Selection cleared.");
            }
            "remove-selected" => {
                let removed = store.remove_selected();
                println!("Removed {removed} rows.");
            }
            "move" => {
                let ids = parts.next().map(parse_id_list);
                let index = parts.next().and_then(|s| s.parse::<usize>().ok());
                match (ids, index) {
                    (Some(ids), Some(index)) => {
                        let moved = store.move_tasks(&ids, index);
                        println!("Moved {moved} rows.");
                    }
                    _ => println!("Usage: move <ids_csv> <index>"),
                }
            }
            "bar" => {
                let id = parts.next().and_then(|s| s.parse::<TaskId>().ok());
                let kind = parts.next().and_then(BarKind::from_str);
                let gesture = parts.next().and_then(parse_gesture);
                let delta = parts.next().and_then(|s| s.parse::<i64>().ok());
                match (id, kind, gesture, delta) {
                    (Some(id), Some(kind), Some(gesture), Some(delta)) => {
                        match drag_bar(&mut store, id, kind, gesture, delta) {
                            Ok(message) | Err(message) => println!("{message}"),
                        }
                    }
                    _ => println!(
                        "Usage: bar <id> <planned|actual> <move|resize_start|resize_end> <days>"
                    ),
                }
            }
            "range" => {
                let range = store.display_range(dates::today());
                println!(
                    "Range {} - {} ({} days).",
                    dates::format(range.start),
                    dates::format(range.end),
                    dates::days_between(range.start, range.end) + 1
                );
            }
            "holidays" => {
                if let Some(path) = parts.next() {
                    if store.calendar().load_from_path(path) {
                        println!("Holidays loaded from {path}.");
                    } else if store.calendar().is_ready() {
                        println!("Holidays were already loaded.");
                    } else {
                        println!("Could not load holidays from {path}.");
                    }
                    continue;
                }
                match store.calendar().table() {
                    Some(table) => {
                        println!("{} holidays loaded.", table.len());
                        for record in table.records() {
                            println!("  {} {}", dates::format(record.date), record.name);
                        }
                    }
                    None => println!("Holidays not loaded; only weekends are skipped."),
                }
            }
            "save" | "load" => {
                let Some(format) = parts.next() else {
                    println!("Usage: {cmd} <json|csv|sqlite> [path]");
                    continue;
                };
                let path = parts.next().unwrap_or(default_path.as_str());
                if cmd == "save" {
                    match save_rows(&store, format, path) {
                        Ok(()) => println!("Saved {} rows to {path}.", store.len()),
                        Err(message) => println!("{message}"),
                    }
                } else {
                    match load_rows(&mut store, format, path) {
                        Ok(count) => println!("Loaded {count} rows from {path}."),
                        Err(message) => println!("{message}"),
                    }
                }
            }
            "export-csv" => match parts.next() {
                Some(path) => match save_rows(&store, "csv", path) {
                    Ok(()) => println!("Exported {} rows to {path}.", store.len()),
                    Err(message) => println!("{message}"),
                },
                None => println!("Usage: export-csv <path>"),
            },
            _ => println!("Unknown command '{cmd}'. Type 'help'."),
        }
    }

    Ok(())
}
