use axum::Json;

use crate::errors::AppError;
use crate::support::{compute, validate, SupportInputs, SupportResult};

/// POST /api/v1/support/calculate
/// Hard preconditions are checked first; advisory warnings ride along with the result.
pub async fn handle_calculate(
    Json(inputs): Json<SupportInputs>,
) -> Result<Json<SupportResult>, AppError> {
    let report = validate(&inputs);
    if !report.is_valid {
        return Err(AppError::Validation(report.errors.join("; ")));
    }
    Ok(Json(compute(&inputs)))
}
