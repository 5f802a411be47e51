//! Command line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Rewrites Formik components under a directory into Conform components
#[derive(Parser, Debug)]
#[command(name = "formik-to-conform")]
#[command(author, version, about, long_about = None)]
#[command(after_help = r#"EXAMPLES:
    # Convert every .jsx/.tsx file under src/ in place
    formik-to-conform src

    # Report what would change without writing
    formik-to-conform src --dry-run

    # Read from a wrapper package instead of formik
    formik-to-conform src --options '{"sourceModule":"@acme/forms"}'

Set RUST_LOG=debug to see every rewritten site.
"#)]
pub struct Args {
    /// Directory to walk
    #[arg()]
    pub dir: PathBuf,

    /// Conversion options as JSON (sourceModule, targetModule, yupModule, typescript)
    #[arg(long = "options")]
    pub options: Option<String>,

    /// Convert without writing files back
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}
