use std::fmt;

use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::LoyaltyError;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgramId(String);

impl ProgramId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh random id (UUID v4 layout) drawn from the session generator.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let bytes: [u8; 16] = rng.gen();
        Self(uuid::Builder::from_random_bytes(bytes).into_uuid().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProgramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProgramId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A loyalty program under the fixed-value model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    pub id: ProgramId,
    pub name: String,
    pub token_symbol: String,
    /// Always >= 1.
    pub fixed_cents_per_point: u32,
    pub earn_rate_pct: Decimal,
    pub breakage_pct: Decimal,
}

/// Raw, unvalidated program input as typed by the user.
#[derive(Clone, Debug)]
pub struct ProgramDraft {
    pub name: String,
    pub token_symbol: String,
    pub fixed_cents_per_point: i64,
    pub earn_rate_pct: Decimal,
    pub breakage_pct: Decimal,
}

/// Validated program economics, ready to be stamped with an id.
struct Normalized {
    name: String,
    token_symbol: String,
    fixed_cents_per_point: u32,
    earn_rate_pct: Decimal,
    breakage_pct: Decimal,
}

impl ProgramDraft {
    fn normalize(&self) -> Result<Normalized, LoyaltyError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(LoyaltyError::EmptyName);
        }
        let token_symbol = self.token_symbol.trim().to_uppercase();
        if token_symbol.is_empty() {
            return Err(LoyaltyError::EmptyTokenSymbol);
        }

        let fixed_cents_per_point = self.fixed_cents_per_point.clamp(1, u32::MAX as i64) as u32;
        if i64::from(fixed_cents_per_point) != self.fixed_cents_per_point {
            warn!(
                program = name,
                requested = self.fixed_cents_per_point,
                clamped = fixed_cents_per_point,
                "cents per point out of range, clamped"
            );
        }
        let earn_rate_pct = self.earn_rate_pct.max(Decimal::ZERO);
        if earn_rate_pct != self.earn_rate_pct {
            warn!(
                program = name,
                requested = %self.earn_rate_pct,
                clamped = %earn_rate_pct,
                "earn rate percentage out of range, clamped"
            );
        }
        let breakage_pct = self.breakage_pct.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
        if breakage_pct != self.breakage_pct {
            warn!(
                program = name,
                requested = %self.breakage_pct,
                clamped = %breakage_pct,
                "breakage percentage out of range, clamped"
            );
        }

        Ok(Normalized {
            name: name.to_string(),
            token_symbol,
            fixed_cents_per_point,
            earn_rate_pct,
            breakage_pct,
        })
    }
}

impl Normalized {
    fn into_program(self, id: ProgramId) -> Program {
        Program {
            id,
            name: self.name,
            token_symbol: self.token_symbol,
            fixed_cents_per_point: self.fixed_cents_per_point,
            earn_rate_pct: self.earn_rate_pct,
            breakage_pct: self.breakage_pct,
        }
    }
}

/// The three demo programs restored by a reset.
pub fn seed_programs() -> Vec<Program> {
    vec![
        Program {
            id: ProgramId::new("seed-brew"),
            name: "Brew & Bean Rewards".into(),
            token_symbol: "BREW".into(),
            fixed_cents_per_point: 100,
            earn_rate_pct: Decimal::new(5, 0),
            breakage_pct: Decimal::new(20, 0),
        },
        Program {
            id: ProgramId::new("seed-jet"),
            name: "JetStream Miles".into(),
            token_symbol: "MILE".into(),
            fixed_cents_per_point: 1,
            earn_rate_pct: Decimal::new(2, 0),
            breakage_pct: Decimal::new(35, 0),
        },
        Program {
            id: ProgramId::new("seed-fuel"),
            name: "FitFuel Points".into(),
            token_symbol: "FUEL".into(),
            fixed_cents_per_point: 10,
            earn_rate_pct: Decimal::new(35, 1),
            breakage_pct: Decimal::new(15, 0),
        },
    ]
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgramRegistry {
    programs: Vec<Program>,
    selected: Option<ProgramId>,
}

impl Default for ProgramRegistry {
    fn default() -> Self {
        Self::seeded()
    }
}

impl ProgramRegistry {
    pub fn seeded() -> Self {
        let programs = seed_programs();
        let selected = programs.first().map(|p| p.id.clone());
        Self { programs, selected }
    }

    /// Rebuilds a registry from previously exported parts. A dangling
    /// selection falls back to the first program.
    pub fn from_parts(programs: Vec<Program>, selected: Option<ProgramId>) -> Self {
        let selected = selected
            .filter(|id| programs.iter().any(|p| &p.id == id))
            .or_else(|| programs.first().map(|p| p.id.clone()));
        Self { programs, selected }
    }

    /// Newest first.
    pub fn list(&self) -> &[Program] {
        &self.programs
    }

    pub fn get(&self, id: &ProgramId) -> Option<&Program> {
        self.programs.iter().find(|p| &p.id == id)
    }

    pub fn selected_id(&self) -> Option<&ProgramId> {
        self.selected.as_ref()
    }

    pub fn selected(&self) -> Option<&Program> {
        self.selected.as_ref().and_then(|id| self.get(id))
    }

    pub fn select(&mut self, id: &ProgramId) -> Result<&Program, LoyaltyError> {
        let idx = self.position(id)?;
        self.selected = Some(id.clone());
        Ok(&self.programs[idx])
    }

    /// Validates and inserts a new program at the front of the list, and
    /// makes it the selected program.
    pub fn create<R: Rng + ?Sized>(
        &mut self,
        draft: &ProgramDraft,
        rng: &mut R,
    ) -> Result<Program, LoyaltyError> {
        let normalized = draft.normalize()?;
        let mut id = ProgramId::random(rng);
        while self.get(&id).is_some() {
            id = ProgramId::random(rng);
        }
        let program = normalized.into_program(id);
        info!(id = %program.id, name = %program.name, symbol = %program.token_symbol, "program created");
        self.programs.insert(0, program.clone());
        self.selected = Some(program.id.clone());
        Ok(program)
    }

    /// Replaces the economics of an existing program. The id and position
    /// are kept.
    pub fn update(&mut self, id: &ProgramId, draft: &ProgramDraft) -> Result<Program, LoyaltyError> {
        let idx = self.position(id)?;
        let normalized = draft.normalize()?;
        let program = normalized.into_program(id.clone());
        self.programs[idx] = program.clone();
        info!(id = %id, "program updated");
        Ok(program)
    }

    pub fn remove(&mut self, id: &ProgramId) -> Result<Program, LoyaltyError> {
        let idx = self.position(id)?;
        let removed = self.programs.remove(idx);
        if self.selected.as_ref() == Some(id) {
            self.selected = self.programs.first().map(|p| p.id.clone());
        }
        info!(id = %id, "program removed");
        Ok(removed)
    }

    pub fn reset(&mut self) {
        *self = Self::seeded();
    }

    fn position(&self, id: &ProgramId) -> Result<usize, LoyaltyError> {
        self.programs
            .iter()
            .position(|p| &p.id == id)
            .ok_or_else(|| LoyaltyError::UnknownProgram(id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use rust_decimal_macros::dec;

    fn draft(name: &str, symbol: &str, cents: i64) -> ProgramDraft {
        ProgramDraft {
            name: name.into(),
            token_symbol: symbol.into(),
            fixed_cents_per_point: cents,
            earn_rate_pct: dec!(5),
            breakage_pct: dec!(10),
        }
    }

    #[test]
    fn seeded_registry_selects_first_seed() {
        let registry = ProgramRegistry::seeded();
        assert_eq!(registry.list().len(), 3);
        assert_eq!(registry.selected_id(), Some(&ProgramId::new("seed-brew")));
    }

    #[test]
    fn create_clamps_and_prepends() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut registry = ProgramRegistry::seeded();
        let mut d = draft("  Corner Deli ", "deli", -40);
        d.earn_rate_pct = dec!(-3);
        d.breakage_pct = dec!(140);

        let program = registry.create(&d, &mut rng).unwrap();
        assert_eq!(program.name, "Corner Deli");
        assert_eq!(program.token_symbol, "DELI");
        assert_eq!(program.fixed_cents_per_point, 1);
        assert_eq!(program.earn_rate_pct, Decimal::ZERO);
        assert_eq!(program.breakage_pct, dec!(100));

        assert_eq!(registry.list().len(), 4);
        assert_eq!(registry.list()[0].id, program.id);
        assert_eq!(registry.selected_id(), Some(&program.id));
    }

    #[test]
    fn create_rejects_empty_fields_without_mutation() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut registry = ProgramRegistry::seeded();
        assert_eq!(
            registry.create(&draft("   ", "X", 1), &mut rng),
            Err(LoyaltyError::EmptyName)
        );
        assert_eq!(
            registry.create(&draft("Deli", "", 1), &mut rng),
            Err(LoyaltyError::EmptyTokenSymbol)
        );
        assert_eq!(registry, ProgramRegistry::seeded());
    }

    #[test]
    fn remove_moves_selection_to_first_remaining() {
        let mut registry = ProgramRegistry::seeded();
        let removed = registry.remove(&ProgramId::new("seed-brew")).unwrap();
        assert_eq!(removed.token_symbol, "BREW");
        assert_eq!(registry.selected_id(), Some(&ProgramId::new("seed-jet")));
        assert!(matches!(
            registry.remove(&ProgramId::new("seed-brew")),
            Err(LoyaltyError::UnknownProgram(_))
        ));
    }

    #[test]
    fn reset_restores_seeds() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut registry = ProgramRegistry::seeded();
        registry.create(&draft("Deli", "DELI", 25), &mut rng).unwrap();
        registry.select(&ProgramId::new("seed-fuel")).unwrap();
        registry.reset();
        assert_eq!(registry, ProgramRegistry::seeded());
    }

    #[test]
    fn from_parts_repairs_dangling_selection() {
        let registry =
            ProgramRegistry::from_parts(seed_programs(), Some(ProgramId::new("gone")));
        assert_eq!(registry.selected_id(), Some(&ProgramId::new("seed-brew")));
    }

    #[test]
    fn update_clamps_like_create_and_keeps_position() {
        let mut registry = ProgramRegistry::seeded();
        let jet = ProgramId::new("seed-jet");

        let mut d = draft("Jet Miles", "jet", 0);
        d.earn_rate_pct = dec!(-1.5);
        let updated = registry.update(&jet, &d).unwrap();
        assert_eq!(updated.id, jet);
        assert_eq!(updated.token_symbol, "JET");
        assert_eq!(updated.fixed_cents_per_point, 1);
        assert_eq!(updated.earn_rate_pct, Decimal::ZERO);
        assert_eq!(registry.list()[1], updated);

        let updated = registry.update(&jet, &draft("Jet Miles", "JET", -250)).unwrap();
        assert_eq!(updated.fixed_cents_per_point, 1);

        let huge = i64::from(u32::MAX) + 1;
        let updated = registry.update(&jet, &draft("Jet Miles", "JET", huge)).unwrap();
        assert_eq!(updated.fixed_cents_per_point, u32::MAX);

        assert_eq!(
            registry.update(&jet, &draft("", "JET", 10)),
            Err(LoyaltyError::EmptyName)
        );
        assert_eq!(registry.get(&jet), Some(&updated));
        assert!(matches!(
            registry.update(&ProgramId::new("gone"), &draft("X", "X", 1)),
            Err(LoyaltyError::UnknownProgram(_))
        ));
    }
}
