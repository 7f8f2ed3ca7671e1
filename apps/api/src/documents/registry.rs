//! Document-type registry.
//!
//! Adding a document type is one `register` call: the builder that compiles its prompt
//! and the signature layout the sanitizer applies travel together.

use std::collections::HashMap;

use crate::prompting::builders::{
    ChildSupportDeclarationBuilder, CustodyAgreementBuilder, DivorcePetitionBuilder,
    SettlementAgreementBuilder,
};
use crate::prompting::generic::GenericBuilder;
use crate::prompting::PromptBuilder;
use crate::sanitizer::signature::SignatureLayout;

pub const DIVORCE_PETITION: &str = "divorce_petition";
pub const CUSTODY_AGREEMENT: &str = "custody_agreement";
pub const CHILD_SUPPORT_DECLARATION: &str = "child_support_declaration";
pub const MARITAL_SETTLEMENT_AGREEMENT: &str = "marital_settlement_agreement";

/// Everything the pipeline needs to know about one document type.
pub struct DocumentKind {
    pub id: &'static str,
    pub title: &'static str,
    pub builder: Box<dyn PromptBuilder>,
    pub signatures: SignatureLayout,
}

pub struct DocumentRegistry {
    kinds: HashMap<&'static str, DocumentKind>,
    fallback: DocumentKind,
}

impl DocumentRegistry {
    /// An empty registry; every lookup resolves to the generic fallback.
    pub fn new() -> Self {
        Self {
            kinds: HashMap::new(),
            fallback: DocumentKind {
                id: "generic",
                title: "Legal Document",
                builder: Box::new(GenericBuilder),
                signatures: SignatureLayout::single("Petitioner"),
            },
        }
    }

    /// The registry with every shipped family-law document type.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(DocumentKind {
            id: DIVORCE_PETITION,
            title: "Petition for Dissolution of Marriage",
            builder: Box::new(DivorcePetitionBuilder),
            signatures: SignatureLayout::single("Petitioner"),
        });
        registry.register(DocumentKind {
            id: CUSTODY_AGREEMENT,
            title: "Stipulated Custody and Visitation Agreement",
            builder: Box::new(CustodyAgreementBuilder),
            signatures: SignatureLayout::both_parties(),
        });
        registry.register(DocumentKind {
            id: CHILD_SUPPORT_DECLARATION,
            title: "Declaration Regarding Child Support",
            builder: Box::new(ChildSupportDeclarationBuilder),
            signatures: SignatureLayout::single("Declarant"),
        });
        registry.register(DocumentKind {
            id: MARITAL_SETTLEMENT_AGREEMENT,
            title: "Marital Settlement Agreement",
            builder: Box::new(SettlementAgreementBuilder),
            signatures: SignatureLayout::both_parties(),
        });
        registry
    }

    /// Registers a document type, replacing any previous registration with the same id.
    pub fn register(&mut self, kind: DocumentKind) {
        self.kinds.insert(kind.id, kind);
    }

    pub fn is_registered(&self, document_type: &str) -> bool {
        self.kinds.contains_key(document_type)
    }

    /// Looks up a document type, falling back to the generic kind.
    pub fn resolve(&self, document_type: &str) -> &DocumentKind {
        self.kinds.get(document_type).unwrap_or(&self.fallback)
    }
}

impl Default for DocumentRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
