//! Archetype policy records that parameterize actor behavior.
//!
//! A catalog is validated once at construction and then installed into the
//! world through [`crate::Command::ConfigureArchetypes`]. Spawns resolve their
//! archetype by name against the installed catalog; unknown names fall back to
//! the default policy so a malformed manifest degrades instead of aborting.

use serde::{Deserialize, Serialize};

use crate::{ItemKind, TickCount};

/// Name of the policy every valid catalog must contain.
pub const DEFAULT_ARCHETYPE: &str = "normal";

/// Index of a policy within a configured catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArchetypeId(u16);

impl ArchetypeId {
    /// Creates an archetype id with the provided numeric value.
    #[must_use]
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the id.
    #[must_use]
    pub const fn get(&self) -> u16 {
        self.0
    }
}

/// Movement and engagement intent of a behavior phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseAction {
    /// Close distance toward the player while beyond the near band.
    Advance,
    /// Open distance away from the player.
    Withdraw,
    /// Stay put without firing.
    HoldGround,
    /// Fire when permitted; close distance while beyond the far band.
    Engage,
}

/// One entry in an archetype's cyclic phase sequence.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhaseSpec {
    /// Intent the actor pursues while the phase is active.
    pub action: PhaseAction,
    /// Minimum duration of the phase in ticks.
    pub base_ticks: TickCount,
    /// Upper bound of the random duration extension in ticks.
    pub jitter_ticks: TickCount,
    /// Ticks needed to traverse one tile while the phase is active.
    pub pace: TickCount,
}

/// Weapon parameters of an archetype.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FireSpec {
    /// Ticks between consecutive shots.
    pub cooldown: TickCount,
    /// Projectile speed in world units per second.
    pub speed: f32,
    /// Damage carried by each projectile.
    pub damage: u16,
    /// Half-width of the random aim scatter in degrees.
    pub spread_degrees: f32,
    /// Whether an unobstructed sight line is required before firing.
    pub los_gated: bool,
}

/// Parameters of an archetype's panic retreat.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetreatSpec {
    /// Player distance below which a retreat may trigger.
    pub trigger_distance: f32,
    /// Percent chance per evaluation that the retreat actually triggers.
    pub chance_percent: u8,
    /// Duration of the retreat in ticks.
    pub duration: TickCount,
    /// Ticks needed to traverse one tile while retreating.
    pub pace: TickCount,
}

/// Parameters of an archetype's aimed-shot sub-state.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AimSpec {
    /// Ticks spent winding up before tracking begins.
    pub windup: TickCount,
    /// Ticks spent tracking the player before the shot releases.
    pub track: TickCount,
    /// Angular tracking rate in degrees per tick.
    pub degrees_per_tick: f32,
}

/// One entry in an archetype's drop table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropSpec {
    /// Item spawned when the roll succeeds.
    pub item: ItemKind,
    /// Percent chance that the item drops on death.
    pub chance_percent: u8,
}

/// Complete tuning record for one actor archetype.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArchetypePolicy {
    /// Unique name the spawn manifest refers to.
    pub name: String,
    /// Health assigned to freshly spawned actors.
    pub max_health: u16,
    /// Player distance below which advancing halts.
    pub near_band: f32,
    /// Player distance above which engaging turns into closing.
    pub far_band: f32,
    /// Cyclic phase sequence; never empty.
    pub phases: Vec<PhaseSpec>,
    /// Weapon parameters.
    pub fire: FireSpec,
    /// Panic retreat parameters, if the archetype retreats at all.
    pub retreat: Option<RetreatSpec>,
    /// Aimed-shot parameters, if the archetype takes aimed shots.
    pub aim: Option<AimSpec>,
    /// Items the actor may leave behind on death.
    pub drops: Vec<DropSpec>,
}

/// Rejection raised while validating an archetype catalog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CatalogError {
    /// The catalog contained no policies at all.
    Empty,
    /// No policy carried the required default name.
    MissingDefault,
    /// Two policies shared the same name.
    DuplicateName {
        /// Name that appeared more than once.
        name: String,
    },
    /// A policy carried an empty phase sequence.
    MissingPhases {
        /// Name of the offending policy.
        name: String,
    },
    /// A policy's near band exceeded its far band.
    BandsReversed {
        /// Name of the offending policy.
        name: String,
    },
    /// A percent chance exceeded one hundred.
    ChanceOutOfRange {
        /// Name of the offending policy.
        name: String,
    },
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "archetype catalog must contain at least one policy"),
            Self::MissingDefault => {
                write!(f, "archetype catalog must contain a \"{DEFAULT_ARCHETYPE}\" policy")
            }
            Self::DuplicateName { name } => {
                write!(f, "archetype name \"{name}\" appears more than once")
            }
            Self::MissingPhases { name } => {
                write!(f, "archetype \"{name}\" must declare at least one phase")
            }
            Self::BandsReversed { name } => {
                write!(f, "archetype \"{name}\" near band exceeds its far band")
            }
            Self::ChanceOutOfRange { name } => {
                write!(f, "archetype \"{name}\" carries a chance above 100 percent")
            }
        }
    }
}

impl std::error::Error for CatalogError {}

/// Validated, order-preserving set of archetype policies.
#[derive(Clone, Debug, PartialEq)]
pub struct ArchetypeCatalog {
    policies: Vec<ArchetypePolicy>,
    fallback: ArchetypeId,
}

impl ArchetypeCatalog {
    /// Validates the provided policies and assembles a catalog.
    pub fn new(policies: Vec<ArchetypePolicy>) -> Result<Self, CatalogError> {
        if policies.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut fallback = None;
        for (index, policy) in policies.iter().enumerate() {
            let earlier = &policies[..index];
            if earlier.iter().any(|other| other.name == policy.name) {
                return Err(CatalogError::DuplicateName {
                    name: policy.name.clone(),
                });
            }
            if policy.phases.is_empty() {
                return Err(CatalogError::MissingPhases {
                    name: policy.name.clone(),
                });
            }
            if policy.near_band > policy.far_band {
                return Err(CatalogError::BandsReversed {
                    name: policy.name.clone(),
                });
            }
            let drop_chance_invalid = policy.drops.iter().any(|drop| drop.chance_percent > 100);
            let retreat_chance_invalid = policy
                .retreat
                .map_or(false, |retreat| retreat.chance_percent > 100);
            if drop_chance_invalid || retreat_chance_invalid {
                return Err(CatalogError::ChanceOutOfRange {
                    name: policy.name.clone(),
                });
            }
            if policy.name == DEFAULT_ARCHETYPE {
                fallback = Some(ArchetypeId::new(index as u16));
            }
        }

        match fallback {
            Some(fallback) => Ok(Self { policies, fallback }),
            None => Err(CatalogError::MissingDefault),
        }
    }

    /// Catalog holding the stock archetypes shipped with the engine.
    #[must_use]
    pub fn builtin() -> Self {
        // The default policy sits at index zero by construction.
        Self {
            policies: builtin_policies(),
            fallback: ArchetypeId::new(0),
        }
    }

    /// Resolves an archetype name to its id, if the catalog contains it.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<ArchetypeId> {
        self.policies
            .iter()
            .position(|policy| policy.name == name)
            .map(|index| ArchetypeId::new(index as u16))
    }

    /// Resolves a name, falling back to the default policy when unknown.
    ///
    /// The flag reports whether the fallback was taken.
    #[must_use]
    pub fn resolve_or_fallback(&self, name: &str) -> (ArchetypeId, bool) {
        match self.resolve(name) {
            Some(id) => (id, false),
            None => (self.fallback, true),
        }
    }

    /// Id of the default policy.
    #[must_use]
    pub const fn fallback(&self) -> ArchetypeId {
        self.fallback
    }

    /// Policy stored under the provided id.
    ///
    /// Ids are only minted by `resolve` on the same catalog, so the index
    /// always holds.
    #[must_use]
    pub fn policy(&self, id: ArchetypeId) -> &ArchetypePolicy {
        &self.policies[id.get() as usize]
    }

    /// Number of policies in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    /// Whether the catalog holds no policies; never true for valid catalogs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// Iterator over the policies in catalog order.
    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = &ArchetypePolicy> {
        self.policies.iter()
    }
}

fn builtin_policies() -> Vec<ArchetypePolicy> {
    vec![
        ArchetypePolicy {
            name: String::from(DEFAULT_ARCHETYPE),
            max_health: 80,
            near_band: 48.0,
            far_band: 120.0,
            phases: vec![
                PhaseSpec {
                    action: PhaseAction::Advance,
                    base_ticks: TickCount::new(90),
                    jitter_ticks: TickCount::new(30),
                    pace: TickCount::new(24),
                },
                PhaseSpec {
                    action: PhaseAction::Engage,
                    base_ticks: TickCount::new(60),
                    jitter_ticks: TickCount::new(30),
                    pace: TickCount::new(24),
                },
                PhaseSpec {
                    action: PhaseAction::HoldGround,
                    base_ticks: TickCount::new(45),
                    jitter_ticks: TickCount::new(15),
                    pace: TickCount::new(24),
                },
            ],
            fire: FireSpec {
                cooldown: TickCount::new(54),
                speed: 180.0,
                damage: 10,
                spread_degrees: 7.5,
                los_gated: true,
            },
            retreat: None,
            aim: None,
            drops: vec![DropSpec {
                item: ItemKind::Medkit,
                chance_percent: 10,
            }],
        },
        ArchetypePolicy {
            name: String::from("rusher"),
            max_health: 50,
            near_band: 24.0,
            far_band: 200.0,
            phases: vec![
                PhaseSpec {
                    action: PhaseAction::Advance,
                    base_ticks: TickCount::new(120),
                    jitter_ticks: TickCount::new(20),
                    pace: TickCount::new(12),
                },
                PhaseSpec {
                    action: PhaseAction::Advance,
                    base_ticks: TickCount::new(40),
                    jitter_ticks: TickCount::new(20),
                    pace: TickCount::new(9),
                },
            ],
            fire: FireSpec {
                cooldown: TickCount::new(90),
                speed: 160.0,
                damage: 8,
                spread_degrees: 12.0,
                los_gated: false,
            },
            retreat: Some(RetreatSpec {
                trigger_distance: 32.0,
                chance_percent: 35,
                duration: TickCount::new(60),
                pace: TickCount::new(10),
            }),
            aim: None,
            drops: vec![DropSpec {
                item: ItemKind::AmmoCache,
                chance_percent: 15,
            }],
        },
        ArchetypePolicy {
            name: String::from("sniper"),
            max_health: 60,
            near_band: 96.0,
            far_band: 320.0,
            phases: vec![
                PhaseSpec {
                    action: PhaseAction::Engage,
                    base_ticks: TickCount::new(75),
                    jitter_ticks: TickCount::new(45),
                    pace: TickCount::new(30),
                },
                PhaseSpec {
                    action: PhaseAction::Withdraw,
                    base_ticks: TickCount::new(50),
                    jitter_ticks: TickCount::new(25),
                    pace: TickCount::new(30),
                },
            ],
            fire: FireSpec {
                cooldown: TickCount::new(150),
                speed: 320.0,
                damage: 25,
                spread_degrees: 2.0,
                los_gated: true,
            },
            retreat: None,
            aim: Some(AimSpec {
                windup: TickCount::new(30),
                track: TickCount::new(50),
                degrees_per_tick: 1.5,
            }),
            drops: vec![
                DropSpec {
                    item: ItemKind::Charm,
                    chance_percent: 5,
                },
                DropSpec {
                    item: ItemKind::AmmoCache,
                    chance_percent: 10,
                },
            ],
        },
        ArchetypePolicy {
            name: String::from("bunker"),
            max_health: 150,
            near_band: 0.0,
            far_band: 280.0,
            phases: vec![PhaseSpec {
                action: PhaseAction::Engage,
                base_ticks: TickCount::new(120),
                jitter_ticks: TickCount::new(40),
                pace: TickCount::new(40),
            }],
            fire: FireSpec {
                cooldown: TickCount::new(36),
                speed: 200.0,
                damage: 12,
                spread_degrees: 5.0,
                los_gated: true,
            },
            retreat: None,
            aim: None,
            drops: vec![
                DropSpec {
                    item: ItemKind::Medkit,
                    chance_percent: 20,
                },
                DropSpec {
                    item: ItemKind::AmmoCache,
                    chance_percent: 20,
                },
            ],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::{builtin_policies, ArchetypeCatalog, ArchetypeId, CatalogError, DEFAULT_ARCHETYPE};

    #[test]
    fn builtin_policies_pass_validation() {
        let catalog = ArchetypeCatalog::new(builtin_policies()).expect("builtin must validate");
        assert_eq!(catalog.len(), 4);
        assert_eq!(catalog.fallback(), ArchetypeId::new(0));
        assert_eq!(catalog.policy(catalog.fallback()).name, DEFAULT_ARCHETYPE);
    }

    #[test]
    fn catalog_rejects_missing_default_policy() {
        let mut policies = builtin_policies();
        policies.retain(|policy| policy.name != DEFAULT_ARCHETYPE);
        let error = ArchetypeCatalog::new(policies).expect_err("default must be required");
        assert_eq!(error, CatalogError::MissingDefault);
    }

    #[test]
    fn catalog_rejects_duplicate_names() {
        let mut policies = builtin_policies();
        let duplicate = policies[1].clone();
        policies.push(duplicate);
        let error = ArchetypeCatalog::new(policies).expect_err("duplicates must be rejected");
        assert_eq!(
            error,
            CatalogError::DuplicateName {
                name: String::from("rusher")
            }
        );
    }

    #[test]
    fn catalog_rejects_empty_phase_sequence() {
        let mut policies = builtin_policies();
        policies[0].phases.clear();
        let error = ArchetypeCatalog::new(policies).expect_err("phases must be required");
        assert_eq!(
            error,
            CatalogError::MissingPhases {
                name: String::from(DEFAULT_ARCHETYPE)
            }
        );
    }

    #[test]
    fn catalog_rejects_reversed_distance_bands() {
        let mut policies = builtin_policies();
        policies[0].near_band = 500.0;
        let error = ArchetypeCatalog::new(policies).expect_err("bands must be ordered");
        assert_eq!(
            error,
            CatalogError::BandsReversed {
                name: String::from(DEFAULT_ARCHETYPE)
            }
        );
    }

    #[test]
    fn catalog_rejects_chance_above_one_hundred() {
        let mut policies = builtin_policies();
        policies[0].drops[0].chance_percent = 101;
        let error = ArchetypeCatalog::new(policies).expect_err("chance must be bounded");
        assert_eq!(
            error,
            CatalogError::ChanceOutOfRange {
                name: String::from(DEFAULT_ARCHETYPE)
            }
        );
    }

    #[test]
    fn unknown_names_resolve_to_the_fallback_policy() {
        let catalog = ArchetypeCatalog::builtin();
        let (id, defaulted) = catalog.resolve_or_fallback("saboteur");
        assert_eq!(id, catalog.fallback());
        assert!(defaulted);

        let (id, defaulted) = catalog.resolve_or_fallback("sniper");
        assert_eq!(catalog.policy(id).name, "sniper");
        assert!(!defaulted);
    }
}
