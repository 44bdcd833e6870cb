use crate::engine::RenameOptions;
use crate::output::ProcessResult;
use crate::session::{Session, SessionError};

/// Process every set of the session.
///
/// A filesystem failure during the batch is reported through the returned
/// result, together with whatever was already renamed. Sessions that cannot
/// be processed at all (no folder, no sets) are errors.
pub fn process_operation(
    session: &mut Session,
    options: &RenameOptions,
    use_color: bool,
) -> Result<ProcessResult, SessionError> {
    let copied = options.output_dir.is_some();

    match session.process(options) {
        Ok(report) => Ok(ProcessResult {
            success: true,
            copied,
            renamed: report.renamed,
            warnings: report.warnings,
            error: None,
            use_color,
        }),
        Err(SessionError::Process(err)) => {
            let error = format!("{:#}", anyhow::Error::from(err.failure));
            Ok(ProcessResult {
                success: false,
                copied,
                renamed: err.completed,
                warnings: err.warnings,
                error: Some(error),
                use_color,
            })
        },
        Err(err) => Err(err),
    }
}
