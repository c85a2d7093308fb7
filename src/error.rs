extern crate thiserror;
use thiserror::Error;

/// Programmer errors that abort a rebalance round outright.
///
/// These are distinct from [`crate::assignment::AssignmentError`], which is an in-band outcome
/// carried on a successfully produced `Assignment` rather than a reason the round never ran.
#[derive(Error, Debug)]
pub enum AssignorError {
    #[error("performAssignment called with an empty workforce.")]
    EmptyWorkforce,
}
