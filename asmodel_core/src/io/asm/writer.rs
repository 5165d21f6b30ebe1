//! Serialize a [`Model`] back into the ASM specification format
use std::fmt::Write;

use crate::metabolic_model::model::Model;

impl Model {
    /// Write the model as ASM specification text
    ///
    /// Parameters are written as literal numbers, so any `${...}` references of the
    /// source specification are resolved in the output.
    ///
    /// The reaction line has no slot for a human-readable name, so [`Reaction::name`]
    /// is not written and reads back as `None`. A warning is logged for every named
    /// reaction; use JSON to keep names.
    ///
    /// [`Reaction::name`]: crate::metabolic_model::reaction::Reaction::name
    pub fn to_asm(&self) -> String {
        for reaction in self.reactions.values() {
            if let Some(name) = &reaction.name {
                log::warn!(
                    "Reaction {} is named {:?}, names are not kept in ASM output",
                    reaction.id,
                    name
                );
            }
        }
        let mut out = String::new();
        // Writing to a String can't fail
        let _ = self.write_sections(&mut out);
        out
    }

    fn write_sections(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out, "[Specification]")?;
        writeln!(out, "type : {}", self.model_type)?;

        let id_missing = self
            .id
            .as_ref()
            .is_some_and(|_| !self.identifiers.contains_key("id"));
        if !self.identifiers.is_empty() || id_missing {
            writeln!(out, "\n[Identifiers]")?;
            if let (true, Some(id)) = (id_missing, &self.id) {
                writeln!(out, "id : {}", id)?;
            }
            for (key, value) in &self.identifiers {
                writeln!(out, "{} : {}", key, value)?;
            }
        }

        writeln!(out, "\n[Objects]")?;
        for component in self.components.values() {
            match &component.description {
                Some(description) => writeln!(out, "{} : {}", component.id, description)?,
                None => writeln!(out, "{}", component.id)?,
            }
        }

        writeln!(out, "\n[Initials]")?;
        for component in self.components.values() {
            writeln!(out, "{} : {}", component.id, component.initial)?;
        }

        if self.components.values().any(|c| c.bound_class.is_some()) {
            writeln!(out, "\n[Bounds]")?;
            for component in self.components.values() {
                if let Some(tag) = &component.bound_class {
                    writeln!(out, "{} : {}", component.id, tag)?;
                }
            }
        }

        writeln!(out, "\n[Reactions]")?;
        for reaction in self.reactions.values() {
            write!(out, "{} : {}", reaction.id, reaction.equation().trim())?;
            if let Some(kind) = &reaction.kind {
                write!(out, " | {}", kind)?;
            }
            if !reaction.parameters.is_empty() {
                let parameters = reaction
                    .parameters
                    .iter()
                    .map(|(name, value)| format!("{} = {}", name, value))
                    .collect::<Vec<String>>()
                    .join(", ");
                write!(out, " | {}", parameters)?;
            }
            writeln!(out)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod writer_tests {
    use crate::io::asm::parse_asm;

    const SPEC: &str = "
[Specification]
type : michaelis_menten

[Identifiers]
id : toy
author : someone

[Objects]
S : substrate
P
E : enzyme

[Initials]
S : 1e-3
E : 2.5e-6

[Bounds]
E : enzyme

[Variables]
kcat : 13.7

[Reactions]
R1 : S -> P | kcat = ${kcat}, km = 1.3e-4, enzyme = 2.5e-6
R2 : 2 P -> | mass_action | k = 0.25
R3 : -> S | mass_action
";

    #[test]
    fn write_then_read() {
        let model = parse_asm(SPEC).unwrap();
        let text = model.to_asm();
        let reread = parse_asm(&text).unwrap();
        assert_eq!(model, reread);
        assert_eq!(reread.id.as_deref(), Some("toy"));
        assert!(text.contains("R2 : 2 P -> | mass_action | k = 0.25"));
        assert!(text.contains("R3 : -> S | mass_action"));
        assert!(!text.contains("${"));
    }

    #[test]
    fn reaction_names_are_not_written() {
        let mut model = parse_asm(SPEC).unwrap();
        model.reactions["R1"].name = Some("substrate conversion".to_string());
        let text = model.to_asm();
        assert!(!text.contains("substrate conversion"));

        let reread = parse_asm(&text).unwrap();
        assert_eq!(reread.reactions["R1"].name, None);
        model.reactions["R1"].name = None;
        assert_eq!(model, reread);
    }
}
