#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        use $crate::utils::log::log;

        let log_message = format!($($arg)*);
        log($module, log_message)
    }};
}

pub fn log(module: &str, message: String) {
    use colored::Colorize;
    use std::io::{stdout, IsTerminal, Write};
    use crossterm::{execute, terminal::{size, Clear, ClearType}};

    let module_lower = module.to_lowercase();
    let colored_prefix = match module_lower.as_str() {
        "publish" => format!("[{module}]").bright_blue().bold(),
        "commit" | "push" => format!("[{module}]").bright_green().bold(),
        "error" => format!("[{module}]").bright_red().bold(),
        "warn" => format!("[{module}]").bright_magenta().bold(),
        _ => format!("[{module}]").bright_yellow().bold(),
    };

    let mut stdout = stdout().lock();
    let is_terminal = stdout.is_terminal();

    // failures and piped output (CI logs) are never cut
    let width = match module_lower.as_str() {
        "error" | "warn" => None,
        _ if !is_terminal => None,
        _ => size().ok().map(|(width, _)| width as usize),
    };

    if is_terminal {
        execute!(stdout, Clear(ClearType::UntilNewLine)).ok();
    }

    let log_msg = fit_to_width(format!("{colored_prefix} {message}"), width);

    writeln!(stdout, "{log_msg}").ok();
    stdout.flush().ok();
}

fn fit_to_width(line: String, width: Option<usize>) -> String {
    match width {
        Some(width) if line.chars().count() > width => {
            line.chars().take(width.saturating_sub(1)).collect()
        }
        _ => line,
    }
}
