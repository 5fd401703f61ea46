//! The fixed color palette offered to painters.

#[cfg(test)]
#[path = "palette_test.rs"]
mod palette_test;

/// Selectable paint colors, in display order.
pub const PALETTE: [&str; 30] = [
    "#E46E6E", "#FFD635", "#7EED56", "#00CCC0", "#51E9F4", "#94B3FF", "#E4ABFF", "#FF99AA", "#FFB470", "#FFFFFF",
    "#BE0039", "#FF9600", "#00CC78", "#009EAA", "#3690EA", "#6A5CFF", "#B44AC0", "#FF3881", "#9C6926", "#898D90",
    "#6D001A", "#BF4300", "#00A368", "#00756F", "#2450A4", "#493AC1", "#811E9F", "#A00357", "#6D482F", "#000000",
];

/// Color selected before the user or the session picks one.
pub const DEFAULT_SELECTED_COLOR: &str = "#ff0";
