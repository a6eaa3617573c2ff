/* 📖 # Why use a separate file for these error tests?

Some of these tests install a tracing subscriber with the ErrorLayer so span traces
are captured. Keeping them apart from error.rs keeps that setup out of the way of
the plain type tests.
*/

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;
    use crate::{ReldirectError, ReldirectResult, ResultExt};
    use expect_test::expect;
    use std::error::Error;
    use std::io;
    use std::path::PathBuf;
    use tracing::span;
    use tracing::warn_span;
    use tracing_error::ErrorLayer;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    /// Set up tracing with ErrorLayer for tests.
    /// Uses `try_init()` to handle multiple tests running concurrently.
    fn setup_tracing_subscriber() {
        let _ = tracing_subscriber::registry()
            .with(ErrorLayer::default())
            .try_init();
    }

    #[test]
    fn test_error_from_file_error() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let path = PathBuf::from("reldirect.toml");
        let error = ReldirectError::new(ErrorKind::FileError {
            path: path.clone(),
            source: io_err,
        });

        match error.kind() {
            ErrorKind::FileError { path: p, .. } => {
                assert_eq!(p, &path);
            }
            _ => panic!("Expected FileError variant"),
        }
    }

    #[test]
    fn test_parse_error_display() {
        let error = ReldirectError::parse("event", "missing field `path`");
        assert_eq!(
            error.to_string(),
            "Failed to parse event: missing field `path`"
        );
        assert!(error.source().is_none());
    }

    #[test]
    fn test_error_context_attachment() {
        let error = ReldirectError::message("original error")
            .context("first context")
            .with_context(|| "second context".to_string());

        assert_eq!(
            error.to_string(),
            "first context: second context: original error"
        );
    }

    #[test]
    fn test_error_display_with_multiple_contexts() {
        let error = ReldirectError::message("root error")
            .context("first")
            .context("second")
            .context("third");
        assert_eq!(error.to_string(), "first: second: third: root error");
    }

    #[test]
    fn test_error_display_file_error() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "not found");
        let error = ReldirectError::new(ErrorKind::FileError {
            path: PathBuf::from("/tmp/reldirect.toml"),
            source: io_err,
        });
        let display = error.to_string();
        assert!(display.contains("/tmp/reldirect.toml"));
        assert!(display.contains("not found"));
    }

    #[test]
    fn test_file_error_source_is_io_error() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "not found");
        let error = ReldirectError::new(ErrorKind::FileError {
            path: PathBuf::from("test.txt"),
            source: io_err,
        });
        assert_eq!(error.source().map(|e| e.to_string()), Some("not found".into()));
    }

    #[test]
    fn test_err_macro_formats_message() {
        let error = crate::err!("port {} unavailable", 8080);
        assert_eq!(error.to_string(), "port 8080 unavailable");
    }

    #[test]
    fn test_result_ext_context_success() {
        let result: ReldirectResult<i32> = Ok(42);
        assert_eq!(result.context("operation failed").unwrap(), 42);
    }

    #[test]
    fn test_result_ext_chaining() {
        let result: ReldirectResult<i32> = Err(Box::new(ReldirectError::message("root")));
        let err = result
            .context("step 1")
            .context("step 2")
            .with_context(|| "step 3".to_string())
            .unwrap_err();
        assert_eq!(err.to_string(), "step 1: step 2: step 3: root");
    }

    #[test]
    fn test_debug_tree_without_trace() {
        let error = ReldirectError::message("something went wrong")
            .context("while loading reldirect.toml")
            .context("at startup");

        expect![[r#"
            something went wrong
            ├─ while loading reldirect.toml
            └─ at startup
        "#]]
        .assert_eq(&format!("{:?}", error));
    }

    #[test]
    fn test_debug_tree_single_context() {
        let error =
            ReldirectError::message("port 8080 unavailable").context("while starting server");

        expect![[r#"
            port 8080 unavailable
            └─ while starting server
        "#]]
        .assert_eq(&format!("{:?}", error));
    }

    #[test]
    fn test_spantrace_includes_span_information() {
        setup_tracing_subscriber();

        let operation_span = span!(tracing::Level::DEBUG, "load_config", attempt = 2);
        let _guard = operation_span.enter();
        let outer_span = warn_span!("read_file");
        let _outer_guard = outer_span.enter();

        let error = ReldirectError::message("disk on fire");
        let debug = format!("{:?}", error);

        assert!(debug.starts_with("disk on fire\n"));
        assert!(debug.contains("Trace:"));
        assert!(debug.contains("load_config"));
        assert!(debug.contains("attempt=2"));
        assert!(debug.contains("read_file"));
    }
}
