use gridwatch_core::{BoardStatus, BoardView, CellDisplay, CellView, SessionState};

use super::constants::*;

/// Render the board as plain text lines, one box per cell.
pub fn render(view: &BoardView, last_update: Option<&str>) -> Vec<String> {
    let mut lines = vec![header(view, last_update)];

    if view.session == SessionState::Disabled {
        let notice = if view.shape.is_empty() {
            NO_GRID_NOTICE
        } else {
            POLLING_FAILED_NOTICE
        };
        lines.push(notice.to_string());
    } else if !view.shape.is_empty() {
        let border = border_line(view.shape.cols as usize);
        for row in view.rows() {
            lines.push(border.clone());
            lines.push(row_line(row, badge_text));
            lines.push(row_line(row, |cell| centered(&cell_label(cell))));
            lines.push(row_line(row, health_bar));
        }
        lines.push(border);
    }

    lines.push(QUIT_HINT.to_string());
    lines
}

fn header(view: &BoardView, last_update: Option<&str>) -> String {
    let session = match view.session {
        SessionState::AwaitingConfig => "Loading config",
        SessionState::Polling => "Polling",
        SessionState::Disabled => "Disabled",
        SessionState::Stopped => "Stopped",
    };
    match &view.status {
        BoardStatus::NotYetAvailable => {
            format!("{session} | Grid {} | waiting for first cycle", view.shape)
        }
        BoardStatus::Ready { cycle, counts } => format!(
            "{session} | Grid {} | Cycle {cycle} | healthy {} empty {} failed {} | updated {}",
            view.shape,
            counts.healthy,
            counts.empty,
            counts.failed,
            last_update.unwrap_or("-")
        ),
    }
}

fn border_line(cols: usize) -> String {
    let segment = "-".repeat(CELL_WIDTH);
    let mut line = String::from("+");
    for _ in 0..cols {
        line.push_str(&segment);
        line.push('+');
    }
    line
}

fn row_line(row: &[CellView], content: impl Fn(&CellView) -> String) -> String {
    let mut line = String::from("|");
    for cell in row {
        line.push_str(&content(cell));
        line.push('|');
    }
    line
}

fn cell_label(cell: &CellView) -> String {
    match &cell.display {
        CellDisplay::Pending => PENDING_LABEL.to_string(),
        CellDisplay::Image { byte_len, .. } => format!("IMG {byte_len}B"),
        CellDisplay::NoImage => NO_IMAGE_LABEL.to_string(),
        CellDisplay::StatusCode(code) => code.to_string(),
    }
}

fn badge_text(cell: &CellView) -> String {
    let badge = cell.badge.map(|code| code.to_string()).unwrap_or_default();
    format!("{badge:<width$}", width = CELL_WIDTH)
}

fn health_bar(cell: &CellView) -> String {
    let mark = if cell.healthy {
        HEALTHY_MARK
    } else {
        UNHEALTHY_MARK
    };
    std::iter::repeat(mark).take(CELL_WIDTH).collect()
}

fn centered(text: &str) -> String {
    let clipped: String = text.chars().take(CELL_WIDTH).collect();
    format!("{clipped:^width$}", width = CELL_WIDTH)
}
