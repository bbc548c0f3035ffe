//! Argument classification and rendering.
//!
//! Turns a handler's declared parameters plus the concrete argument values
//! of one invocation into the `params` field of the request record. Each
//! parameter becomes one labeled fragment; fragments from all parameters
//! are retained and joined in declaration order.

use crate::context::RequestContext;
use crate::render::{render_value, RESPONSE_TOKEN, SESSION_TOKEN};
use crate::types::{ArgValue, Binding, BuildError, HandlerDescriptor, ParamSpec};

/// Separator between per-parameter fragments.
const FRAGMENT_SEPARATOR: &str = ", ";

/// Render the params field for one invocation.
///
/// Handlers with no declared parameters fall back to the raw query string
/// of the ambient request, verbatim and undecoded. Otherwise the supplied
/// argument values must match the declared parameters one-to-one.
pub(crate) fn render_params(
    descriptor: &HandlerDescriptor,
    ctx: &RequestContext,
    args: &[ArgValue],
) -> Result<Option<String>, BuildError> {
    if descriptor.params.is_empty() && args.is_empty() {
        return Ok(ctx.query_string().map(str::to_owned));
    }
    if descriptor.params.len() != args.len() {
        return Err(BuildError::ArityMismatch {
            expected: descriptor.params.len(),
            actual: args.len(),
        });
    }

    let fragments: Vec<String> = descriptor
        .params
        .iter()
        .zip(args)
        .map(|(spec, arg)| fragment(spec, arg))
        .collect();
    Ok(Some(fragments.join(FRAGMENT_SEPARATOR)))
}

/// Build the `<label>:<value>` fragment for one parameter.
fn fragment(spec: &ParamSpec, arg: &ArgValue) -> String {
    let mut out = String::new();
    match &spec.binding {
        Binding::Path(name) => {
            out.push_str("[PathBinding] ");
            out.push_str(&spec.type_name);
            out.push(' ');
            out.push_str(name);
        }
        Binding::Query(name) => {
            out.push_str("[QueryBinding] ");
            out.push_str(&spec.type_name);
            out.push(' ');
            out.push_str(name);
        }
        Binding::None => out.push_str(&spec.type_name),
    }
    out.push(':');

    // Extraction categories, matched top-down.
    match arg {
        ArgValue::Params(map) => {
            for (name, value) in map.iter() {
                out.push_str("\n\t\t");
                out.push_str(name);
                out.push_str(" : ");
                out.push_str(value);
            }
        }
        ArgValue::ResponseSink => out.push_str(RESPONSE_TOKEN),
        ArgValue::Session => out.push_str(SESSION_TOKEN),
        ArgValue::Json(value) => out.push_str(&render_value(value)),
    }
    out
}
