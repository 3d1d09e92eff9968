/// Lazily compiled, process-wide static regex.
///
/// `regex!("^a+$")` compiles once on first use and hands out a
/// `&'static Regex`. The pattern is a literal, so a bad pattern is a bug in
/// this crate rather than a runtime condition.
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).expect("static regex must compile"));
        &*RE
    }};
}

/// Bail out of the current function with a path syntax error at `$pos`.
macro_rules! syntax_error {
    ($query:expr, $pos:expr, $($arg:tt)+) => {
        return Err($crate::QueryError::Syntax {
            query: $query.to_string(),
            position: $pos,
            message: format!($($arg)+),
        })
    };
}
