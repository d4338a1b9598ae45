use colored::*;

/// Returns the sqlgate ASCII art logo
pub fn get_logo() -> String {
    let logo = r#"
  ____ ____ _    ____ ____ ___ ____
  [__  |  | |    | __ |__|  |  |___
  ___] |_\| |___ |__] |  |  |  |___
    "#;

    logo.to_string()
}

/// Returns a colored version of the logo
pub fn get_colored_logo() -> ColoredString {
    get_logo().bright_cyan()
}

/// Display version information with the ASCII art logo
pub fn display_version() {
    println!("{}", get_colored_logo());
    println!("sqlgate CLI version {}", env!("CARGO_PKG_VERSION"));
    println!("Table lineage extraction and freshness validation for SQL pipelines");
    println!("Repository: {}", env!("CARGO_PKG_REPOSITORY"));
}
