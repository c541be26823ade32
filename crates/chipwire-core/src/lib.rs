//! chipwire-core — moteur d'évaluation des puces (chips) câblées
//!
//! Fournit :
//! - `Value`, `Port`, `PortCount` : ports positionnels portant du texte opaque
//! - `SourceRef` / `Sink` / `Connection` : câblage typé (+ tags compacts `w:0`, `c:1:2`)
//! - `Workspace` / `Chip` / `ChipId` : l'état possédé par l'UI, avec ses opérations d'édition
//! - `program` : interpréteur ligne à ligne `IN n` / `OUT n`, lint et listing
//! - `graph` : évaluation en une passe (ordre de création) + vérification du câblage
//! - Erreurs `CoreError` + alias `CoreResult<T>`
//!
//! L'interpréteur et l'évaluateur sont des fonctions totales : une ligne
//! malformée ou une référence pendante se dégrade en valeur vide, jamais en
//! erreur. `CoreError` est réservé aux erreurs côté hôte (configuration,
//! édition d'une puce inexistante, tag illisible, mode strict).
//!
//! Features :
//! - `serde` (par défaut) : derive (dé)sérialisation du workspace et des résultats

#![deny(missing_docs)]

/* ─────────────────────────── Imports ─────────────────────────── */

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/* ─────────────────────────── Modules publics ─────────────────────────── */

/// Interpréteur de programmes de puce (assemblage, exécution, lint, listing).
pub mod program;

/// Évaluation du graphe de puces et diagnostic du câblage.
pub mod graph;

/// Références de source, puits et tags compacts.
pub mod source;

/// Workspace, puces et opérations d'édition.
pub mod workspace;

pub use graph::{check_wiring, evaluate, evaluate_strict, Evaluation, WiringIssue};
pub use program::{execute, lint, listing, parse_program, Diagnostic, Program, Severity};
pub use source::{Connection, Sink, SourceRef};
pub use workspace::{Chip, ChipId, Workspace, DEFAULT_PROGRAM};

/* ─────────────────────────── Résultat commun ─────────────────────────── */

/// Alias résultat commun au core.
pub type CoreResult<T> = core::result::Result<T, CoreError>;

/* ─────────────────────────── Ports / Valeurs ─────────────────────────── */

/// Valeur portée par un port : texte opaque, jamais converti.
///
/// La valeur vide (`""`) représente « rien » : port non câblé, référence
/// non résolue, sortie jamais écrite.
pub type Value = String;

/// Index de port, 0-based en interne (1-based dans le texte des programmes).
pub type Port = usize;

/// Nombre de ports par puce et par workspace, fixé pour toute la session.
///
/// Toujours dans `1..=PortCount::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "usize", into = "usize"))]
pub struct PortCount(usize);

impl PortCount {
    /// Configuration de référence : trois ports.
    pub const REFERENCE: Self = Self(3);
    /// Borne haute acceptée.
    pub const MAX: usize = 64;

    /// Valide un nombre de ports.
    pub fn new(ports: usize) -> CoreResult<Self> {
        if ports == 0 || ports > Self::MAX {
            return Err(CoreError::InvalidPortCount(ports));
        }
        Ok(Self(ports))
    }

    /// Nombre de ports.
    pub const fn get(self) -> usize { self.0 }

    /// Vrai si `port` (0-based) existe.
    pub const fn contains(self, port: Port) -> bool { port < self.0 }

    /// Vecteur de `N` valeurs vides.
    pub fn empty_values(self) -> Vec<Value> { vec![Value::new(); self.0] }
}

impl Default for PortCount {
    fn default() -> Self { Self::REFERENCE }
}

impl TryFrom<usize> for PortCount {
    type Error = CoreError;
    fn try_from(ports: usize) -> CoreResult<Self> { Self::new(ports) }
}

impl From<PortCount> for usize {
    fn from(ports: PortCount) -> Self { ports.0 }
}

impl fmt::Display for PortCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/* ─────────────────────────── Erreurs ─────────────────────────── */

/// Erreurs côté hôte. L'évaluation elle-même n'échoue jamais.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// Nombre de ports hors de `1..=64`.
    #[error("invalid port count {0} (expected 1..={max})", max = PortCount::MAX)]
    InvalidPortCount(usize),

    /// Aucune puce ne porte cet identifiant.
    #[error("unknown chip {0}")]
    UnknownChip(ChipId),

    /// Port inexistant pour la configuration courante.
    #[error("port {port} out of range (ports: {ports})")]
    PortOutOfRange {
        /// Port demandé (0-based).
        port: Port,
        /// Nombre de ports configuré.
        ports: usize,
    },

    /// Tag de référence illisible (`w:<port>`, `c:<chip>:<port>`, `ci:…`, `wo:…`).
    #[error("invalid reference tag `{0}`")]
    InvalidReference(String),

    /// Câblage refusé par l'évaluation stricte.
    #[error("wiring rejected: {}", summarize(.0))]
    Wiring(Vec<WiringIssue>),
}

fn summarize(issues: &[WiringIssue]) -> String {
    match issues {
        [] => "no issue".into(),
        [one] => one.to_string(),
        [first, rest @ ..] => format!("{first} (+{} more)", rest.len()),
    }
}

/* ─────────────────────────── Prélude (reexports utiles) ─────────────────────────── */

/// Prélude pratique pour importer les types/funcs clés du crate.
pub mod prelude {
    /// Réexports utiles pour une importation rapide.
    pub use super::{
        check_wiring, evaluate, evaluate_strict, execute, lint, parse_program, Chip, ChipId,
        Connection, CoreError, CoreResult, Diagnostic, Evaluation, Port, PortCount, Severity,
        Sink, SourceRef, Value, WiringIssue, Workspace,
    };
}

/* ─────────────────────────── Tests ─────────────────────────── */
