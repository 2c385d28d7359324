//! About view

/// Pagina a cui tornare con "back"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackTo {
    Auth,
    Main,
}

pub fn render_about() -> String {
    [
        "=== funChat ===",
        "The task was completed as part of the RSSchool JS/FE 2024Q4 course",
        "Completed by Squaller",
        "Type /back to go back.",
    ]
    .join("\n")
}
