/// Inner width of one cell box, in characters.
pub const CELL_WIDTH: usize = 14;

pub const HEALTHY_MARK: char = '+';
pub const UNHEALTHY_MARK: char = '-';

pub const PENDING_LABEL: &str = "...";
pub const NO_IMAGE_LABEL: &str = "No Image";

pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";
pub const QUIT_HINT: &str = "Type q + Enter to quit.";

pub const NO_GRID_NOTICE: &str = "No grid configured; polling disabled.";
pub const POLLING_FAILED_NOTICE: &str = "Polling could not run; see gridwatch.log.";
