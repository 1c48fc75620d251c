//! Sound type registry and factory
//!
//! The registry is a static table from a type name (as written in the
//! board file) to the function that builds that type from its raw input.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::sources::Location;

use super::{
    Departure, Playlist, Selection, Sound, SoundContext, SoundError, SoundKind, Transit, Vox,
    Weather,
};

/// Builds a sound behavior from its raw board-file input
pub type Constructor = fn(&SoundContext, &Value) -> Result<SoundKind, SoundError>;

/// Identifies a registry entry and the board-file field carrying its input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantDescriptor {
    pub simple_name: &'static str,
    pub config_attribute: &'static str,
}

const fn variant(simple_name: &'static str, config_attribute: &'static str) -> VariantDescriptor {
    VariantDescriptor {
        simple_name,
        config_attribute,
    }
}

const BUILTIN: [(VariantDescriptor, Constructor); 8] = [
    (variant("simple", "file"), setup_simple),
    (variant("random", "files"), setup_random),
    (variant("list", "files"), setup_list),
    (variant("wrapped", "files"), setup_wrapped),
    (variant("vox", "sentence"), setup_vox),
    (variant("weather", "location"), setup_weather),
    (variant("ztm", "line"), setup_transit),
    (variant("lastztm", "line"), setup_last_transit),
];

/// Name → constructor table
#[derive(Default)]
pub struct Registry {
    entries: HashMap<&'static str, (VariantDescriptor, Constructor)>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl Registry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in sound type
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        for (descriptor, constructor) in BUILTIN {
            if let Err(e) = registry.register(descriptor, constructor) {
                warn!(%e, "skipping built-in sound type");
            }
        }
        registry
    }

    /// Add a sound type; names are unique
    pub fn register(
        &mut self,
        descriptor: VariantDescriptor,
        constructor: Constructor,
    ) -> Result<(), SoundError> {
        if self.entries.contains_key(descriptor.simple_name) {
            return Err(SoundError::DuplicateVariant(descriptor.simple_name));
        }
        self.entries.insert(descriptor.simple_name, (descriptor, constructor));
        Ok(())
    }

    pub fn by_name(&self, name: &str) -> Result<(VariantDescriptor, Constructor), SoundError> {
        self.entries
            .get(name)
            .copied()
            .ok_or_else(|| SoundError::NotFound(name.to_string()))
    }

    pub fn descriptor(&self, name: &str) -> Result<VariantDescriptor, SoundError> {
        self.by_name(name).map(|(descriptor, _)| descriptor)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.entries.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

/// Builds configured sounds bound to one audio engine and directory
#[derive(Debug, Clone)]
pub struct SoundFactory {
    registry: Arc<Registry>,
    ctx: SoundContext,
}

impl SoundFactory {
    pub fn new(registry: Arc<Registry>, ctx: SoundContext) -> Self {
        Self { registry, ctx }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Build a sound of type `name` from its raw input
    pub fn build(&self, name: &str, data: &Value) -> Result<Sound, SoundError> {
        let (descriptor, constructor) = self.registry.by_name(name)?;
        let kind = constructor(&self.ctx, data)?;
        debug!(variant = descriptor.simple_name, "sound built");
        Ok(Sound::new(descriptor.simple_name, kind))
    }
}

fn invalid(variant: &'static str, reason: impl Into<String>) -> SoundError {
    SoundError::InvalidInput {
        variant,
        reason: reason.into(),
    }
}

fn text_input(variant: &'static str, data: &Value) -> Result<String, SoundError> {
    match data {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(invalid(variant, format!("expected text, got {}", other))),
    }
}

fn path_list(variant: &'static str, data: &Value) -> Result<Vec<String>, SoundError> {
    let items = data
        .as_array()
        .ok_or_else(|| invalid(variant, format!("expected a list of files, got {}", data)))?;

    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| invalid(variant, format!("expected a file name, got {}", item)))
        })
        .collect()
}

fn clips(
    ctx: &SoundContext,
    selection: Selection,
    paths: Vec<String>,
) -> Result<SoundKind, SoundError> {
    let chunks = paths
        .iter()
        .map(|p| ctx.mixer.read(&ctx.resolve(p)))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(SoundKind::Clips(Playlist::new(selection, chunks, 1.0)?))
}

fn setup_simple(ctx: &SoundContext, data: &Value) -> Result<SoundKind, SoundError> {
    let path = data
        .as_str()
        .ok_or_else(|| invalid("simple", format!("expected a file name, got {}", data)))?;
    clips(ctx, Selection::Sequential, vec![path.to_string()])
}

fn setup_random(ctx: &SoundContext, data: &Value) -> Result<SoundKind, SoundError> {
    clips(ctx, Selection::Random, path_list("random", data)?)
}

fn setup_list(ctx: &SoundContext, data: &Value) -> Result<SoundKind, SoundError> {
    clips(ctx, Selection::Restart, path_list("list", data)?)
}

fn setup_wrapped(ctx: &SoundContext, data: &Value) -> Result<SoundKind, SoundError> {
    clips(ctx, Selection::Wrapped, path_list("wrapped", data)?)
}

fn setup_vox(ctx: &SoundContext, data: &Value) -> Result<SoundKind, SoundError> {
    let sentence = text_input("vox", data)?;
    Ok(SoundKind::Vox(Vox::new(ctx, &sentence)?))
}

fn setup_weather(ctx: &SoundContext, data: &Value) -> Result<SoundKind, SoundError> {
    let location = Location::parse(&text_input("weather", data)?);
    Ok(SoundKind::Weather(Weather::new(ctx, location)))
}

fn setup_transit(ctx: &SoundContext, data: &Value) -> Result<SoundKind, SoundError> {
    let line = text_input("ztm", data)?;
    Ok(SoundKind::Transit(Transit::new(ctx, line, Departure::Next)))
}

fn setup_last_transit(ctx: &SoundContext, data: &Value) -> Result<SoundKind, SoundError> {
    let line = text_input("lastztm", data)?;
    Ok(SoundKind::Transit(Transit::new(ctx, line, Departure::Last)))
}
