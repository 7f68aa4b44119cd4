use clap::{Parser, ValueEnum};

/// Pipeline configuration. Derives `Parser`, so a host binary can either
/// parse it directly or `#[command(flatten)]` it into its own arguments.
#[derive(Clone, Debug, Default, PartialEq, Eq, Parser)]
#[command(about = "Optimization pipeline for search expressions")]
pub struct Options {
    #[arg(long, help = "Keep single-use local bindings instead of inlining them")]
    pub no_inline: bool,

    #[arg(long, help = "Skip compile-time evaluation of constant subexpressions")]
    pub no_fold: bool,

    #[arg(long, help = "Skip hoisting loop-invariant subexpressions out of functions")]
    pub no_pull_out: bool,

    #[arg(long, help = "The style for error reporting", value_enum, default_value_t = ErrorStyle::Normal)]
    pub error_style: ErrorStyle,

    #[arg(long, help = "Use alternative colors in diagnostics")]
    pub alt_color: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ErrorStyle {
    #[default]
    Normal,
    NoHighlight,
    Simple,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_every_pass() {
        let options = Options::try_parse_from(["searchopt"]).unwrap();
        assert_eq!(options, Options::default());
        assert!(!options.no_inline && !options.no_fold && !options.no_pull_out);
    }

    #[test]
    fn flags() {
        let options = Options::try_parse_from([
            "searchopt",
            "--no-inline",
            "--no-pull-out",
            "--error-style",
            "no-highlight",
        ])
        .unwrap();
        assert!(options.no_inline);
        assert!(!options.no_fold);
        assert!(options.no_pull_out);
        assert_eq!(options.error_style, ErrorStyle::NoHighlight);
    }
}
