//! Field name resolution.
//!
//! ```text
//! "{count(row)}_ROWS"  --count(row) = 3-->  "3_ROWS"
//! "{@code}"            --@code = "FOO_1"--> "FOO_1" --name filter--> "FOO"
//! "{@missing}"         --no match-------->  "{@missing}"  (left as written)
//! ```
//!
//! The placeholder is resolved against the field's *inbound* context, so a
//! field inside an expansion instance sees the element it was stamped for.

use super::evaluator::Evaluator;
use crate::definition::PlaceholderExpr;
use crate::{FieldDef, QueryEngine, QueryError, Scope};

impl<Q: QueryEngine + ?Sized> Evaluator<'_, '_, Q> {
    pub(super) fn resolve_name(&mut self, def: &FieldDef, context: &Scope<Q::Node>) -> Result<String, QueryError> {
        let template = def.name();

        let substitution = match template.placeholder().map(|p| &p.expr) {
            None => None,
            Some(PlaceholderExpr::Count(query)) => Some(self.select(context, query)?.count().to_string()),
            Some(PlaceholderExpr::Text(query)) => self.select(context, query)?.first_text(self.engine),
        };

        let name = match substitution {
            Some(value) => template.substitute(&value),
            None => {
                if template.is_templated() {
                    log::trace!("placeholder in '{}' has no match; keeping it as written", template.as_str());
                }
                template.as_str().to_string()
            }
        };

        Ok(def.options().apply_name(name))
    }
}
