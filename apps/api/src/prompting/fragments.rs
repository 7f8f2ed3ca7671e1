// Cross-cutting prompt fragments shared by every document builder.
// Document-specific skeletons live with their builders in builders.rs.

/// Line the model must emit before the document body.
pub const BEGIN_MARKER: &str = "=== BEGIN DOCUMENT ===";
/// Line the model must emit after the document body.
pub const END_MARKER: &str = "=== END DOCUMENT ===";

/// System instruction for all registered family-law documents.
pub const FAMILY_LAW_SYSTEM: &str = "You are a senior California family law paralegal \
    drafting court-ready documents for a licensed attorney's review. \
    Write in a formal, neutral, precise register. \
    Never editorialize, never speculate about facts not provided, and never address the reader. \
    You produce the document text only.";

/// System instruction for unregistered document types.
pub const GENERIC_SYSTEM: &str = "You are a careful legal drafting assistant. \
    Write in a formal, neutral register and produce the document text only.";

/// Formatting rules injected into every registered builder.
pub const FORMATTING_RULES: &str = "\
- Refer to the parties in the third person by role (\"Petitioner\", \"Respondent\") after first naming them.
- Cite statutes as \"Cal. Fam. Code § <section>\" (e.g. Cal. Fam. Code § 2310). Never abbreviate differently.
- Section headings in UPPERCASE on their own line, numbered paragraphs beneath each heading.
- Dates written as \"Month D, YYYY\". Currency written as \"$1,234\".
- Plain text only: no markdown, no tables, no bullet symbols.";

/// Output constraints injected into every builder, registered or generic.
pub const OUTPUT_CONSTRAINTS: &str = "\
- The first line of your reply must be exactly: === BEGIN DOCUMENT ===
- The last line of your reply must be exactly: === END DOCUMENT ===
- Do NOT use placeholders of any kind (no square brackets, no \"TBD\", no \"to be determined\"). If a fact is not provided, omit the sentence that would need it.
- Do NOT include disclaimers, notes to the reader, commentary, or explanations.
- Do NOT write a signature block or signature lines; they are appended automatically.";

/// Minimal formatting guidance for the generic builder.
pub const GENERIC_FORMATTING: &str = "\
- Use clear section headings of your choosing.
- Plain text only: no markdown.";
