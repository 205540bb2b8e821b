//! Prompt construction for one law framework.
//!
//! The instruction carries the law name, the retrieved excerpts with their
//! similarity scores, the subject data, the required JSON output schema, and
//! a severity rubric. The rubric and the subject wording depend on
//! [`SubjectFocus`]: ingredient reviews and claim reviews are phrased
//! differently, and a claim review tells the judge to ignore ingredients.

use std::fmt::Write;

use crate::models::{LawFramework, Subject};
use crate::retrieve::EvidenceSet;

/// Which part of the subject the judge is asked to review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectFocus {
    Ingredients,
    Claims,
}

impl SubjectFocus {
    /// Ingredients take priority whenever they are present.
    ///
    /// Returns `None` for an empty subject; callers must not build a prompt
    /// in that case.
    pub fn of(subject: &Subject) -> Option<Self> {
        if subject.has_ingredients() {
            Some(SubjectFocus::Ingredients)
        } else if subject.has_claims() {
            Some(SubjectFocus::Claims)
        } else {
            None
        }
    }
}

const INGREDIENT_RUBRIC: &str = "\
SEVERITY RUBRIC (one entry in \"severities\" per entry in \"issues\", same order):
- \"high\": known allergens or substances the law restricts or prohibits.
- \"medium\": irritants or controversial substances.
- \"low\": common ingredients considered safe.
An ingredient the excerpts do not mention is COMPLIANT. Never infer non-compliance from silence.";

const CLAIM_RUBRIC: &str = "\
SEVERITY RUBRIC (one entry in \"severities\" per entry in \"issues\", same order):
- \"high\": medical, therapeutic, structure/function, or disease-prevention claims.
- \"medium\": unsubstantiated efficacy, anti-aging, or clinical-reference claims.
- \"low\": basic function, texture, or sensory descriptions.
Judge ONLY the marketing claims. Ignore ingredients entirely: do not report ingredient, \
formulation, concentration, or chemical issues.";

/// Assemble the instruction for one framework.
pub fn build_prompt(
    framework: &LawFramework,
    evidence: &EvidenceSet,
    subject: &Subject,
    focus: SubjectFocus,
) -> String {
    let mut out = String::new();
    let reviewer = match focus {
        SubjectFocus::Ingredients => "product ingredients",
        SubjectFocus::Claims => "product marketing claims",
    };
    let _ = writeln!(
        out,
        "You are a U.S. cosmetics regulatory expert reviewing {} against \"{}\".",
        reviewer, framework.name
    );
    let _ = writeln!(
        out,
        "Base your judgment only on the law excerpts below (category \"{}\").\n",
        framework.category
    );

    let _ = writeln!(out, "--- LAW: {} ---", framework.name);
    for (i, result) in evidence.items().iter().enumerate() {
        let _ = writeln!(
            out,
            "[Excerpt {} | similarity {:.3}]\n{}\n",
            i + 1,
            result.similarity,
            result.chunk_text
        );
    }

    let _ = writeln!(out, "--- CLIENT DATA ---");
    match focus {
        SubjectFocus::Ingredients => {
            let _ = writeln!(out, "Ingredients: {}", subject.ingredients.join(", "));
            if subject.has_claims() {
                let _ = writeln!(out, "(Label claims, context only: {})", subject.claims.join("; "));
            }
        }
        SubjectFocus::Claims => {
            let _ = writeln!(out, "Marketing claims:");
            for claim in &subject.claims {
                let _ = writeln!(out, "- {}", claim);
            }
        }
    }

    let _ = writeln!(out, "\n--- OUTPUT FORMAT (JSON) ---");
    let _ = writeln!(
        out,
        r#"{{
  "law": "{}",
  "compliant": true or false,
  "issues": ["specific issues, if any"],
  "fixes": ["concrete fixes, if any"],
  "confidence": float between 0 and 1,
  "compliance_score": integer between 0 and 100,
  "severities": ["low" | "medium" | "high" | "critical", one per issue]
}}"#,
        framework.name
    );

    let _ = writeln!(
        out,
        "\n{}",
        match focus {
            SubjectFocus::Ingredients => INGREDIENT_RUBRIC,
            SubjectFocus::Claims => CLAIM_RUBRIC,
        }
    );
    let _ = write!(out, "\nReturn only the JSON object. Do not include any text outside it.");
    out
}
