use crate::error::{BindingFailure, BindingFailureReason, ResolveError};
use crate::ports::ToolchainProvider;
use gradleplan_types::document::{BindingSource, LiteralValue, SdkBindings, SdkField};
use gradleplan_types::plan::{ResolvedSdk, ResolvedSdkValue, ValueOrigin};
use tracing::debug;

/// Resolve every SDK binding to a concrete value.
///
/// `Literal` bindings are used as written; `Indirect` bindings are looked up in `toolchain`.
/// Values are coerced to the field's type. All failures are collected before returning.
pub fn resolve_sdk_bindings(
    bindings: &SdkBindings,
    toolchain: &dyn ToolchainProvider,
) -> Result<ResolvedSdk, ResolveError> {
    let mut resolved = ResolvedSdk::new();
    let mut failures = Vec::new();

    for (field, source) in bindings {
        let (raw, origin) = match source {
            BindingSource::Literal(value) => (value.clone(), ValueOrigin::Literal),
            BindingSource::Indirect { toolchain: key } => match toolchain.lookup(key) {
                Some(v) => (
                    LiteralValue::Text(v.trim().to_string()),
                    ValueOrigin::Toolchain { key: key.clone() },
                ),
                None => {
                    failures.push(BindingFailure {
                        field: *field,
                        reason: BindingFailureReason::MissingToolchainValue { key: key.clone() },
                    });
                    continue;
                }
            },
        };

        match coerce(*field, raw) {
            Ok(value) => {
                debug!(field = %field, value = %value, "resolved sdk binding");
                resolved.insert(*field, ResolvedSdkValue { value, origin });
            }
            Err(reason) => failures.push(BindingFailure {
                field: *field,
                reason,
            }),
        }
    }

    if failures.is_empty() {
        Ok(resolved)
    } else {
        Err(ResolveError::UnresolvedBinding { failures })
    }
}

fn coerce(field: SdkField, value: LiteralValue) -> Result<LiteralValue, BindingFailureReason> {
    if field.is_integer() {
        let n = match value {
            LiteralValue::Int(n) => n,
            LiteralValue::Text(s) => {
                s.trim()
                    .parse::<i64>()
                    .map_err(|_| BindingFailureReason::NotAnInteger {
                        value: s.clone(),
                    })?
            }
        };
        if n <= 0 {
            return Err(BindingFailureReason::NotPositive { value: n });
        }
        return Ok(LiteralValue::Int(n));
    }

    let text = match value {
        LiteralValue::Int(n) => n.to_string(),
        LiteralValue::Text(s) => s,
    };
    if text.trim().is_empty() {
        return Err(BindingFailureReason::Empty);
    }
    Ok(LiteralValue::Text(text))
}
