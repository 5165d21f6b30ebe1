//! Export the reaction network of one or more models as a SIF (Simple Interaction Format) edge list
//!
//! Every reaction `R` is drawn as two nodes, `R_s` collecting its substrates and `R_p`
//! emitting its products:
//!
//! ```text
//! A cr R1_s
//! R1_p rc B
//! R1_s rxn R1_p
//! ```
//!
//! When several models are exported together reaction nodes are qualified by the model's
//! 1-based position (`m2_R1_s`), so reactions sharing an id in different models stay apart.
//! Component nodes are not qualified and are shared between models.
use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::metabolic_model::model::Model;
use crate::metabolic_model::reaction::Reaction;

/// Node used in place of an empty side of a reaction
pub const EMPTY_SIDE_NODE: &str = "X";

/// Build the SIF edges of every reaction in `models`, in model then declaration order
pub fn sif_edges(models: &[Model]) -> Vec<String> {
    let qualify = models.len() > 1;
    models
        .iter()
        .enumerate()
        .flat_map(|(index, model)| {
            let prefix = if qualify {
                format!("m{}_", index + 1)
            } else {
                String::new()
            };
            model
                .reactions
                .values()
                .flat_map(move |reaction| reaction_edges(&prefix, reaction))
        })
        .collect()
}

fn reaction_edges(node_prefix: &str, reaction: &Reaction) -> Vec<String> {
    let substrate = format!("{}{}_s", node_prefix, reaction.id);
    let product = format!("{}{}_p", node_prefix, reaction.id);
    let mut edges = Vec::with_capacity(reaction.reactants.len() + reaction.products.len() + 1);
    if reaction.reactants.is_empty() {
        edges.push(format!("{} cr {}", EMPTY_SIDE_NODE, substrate));
    }
    for component in reaction.reactants.keys() {
        edges.push(format!("{} cr {}", component, substrate));
    }
    if reaction.products.is_empty() {
        edges.push(format!("{} rc {}", product, EMPTY_SIDE_NODE));
    }
    for component in reaction.products.keys() {
        edges.push(format!("{} rc {}", product, component));
    }
    edges.push(format!("{} rxn {}", substrate, product));
    edges
}

/// Write the SIF edge list of `models` to `path`, one edge per line
pub fn write_sif<P: AsRef<Path>>(models: &[Model], path: P) -> Result<(), SifError> {
    let mut text = sif_edges(models).join("\n");
    text.push('\n');
    fs::write(path, text)?;
    Ok(())
}

#[derive(Error, Debug)]
pub enum SifError {
    #[error("Unable to write network file")]
    UnableToWrite(#[from] std::io::Error),
}
