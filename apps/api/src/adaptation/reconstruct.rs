//! Reconstruction: rebuilds the nested profile from the coordinate-keyed results.
//!
//! Walks the input in its original order, so the output shape never depends on
//! task completion order. Only description and highlight text is replaced.

use std::collections::{BTreeMap, HashMap};

use crate::adaptation::fanout::AdaptationResult;
use crate::adaptation::tasks::FieldCoordinate;
use crate::models::profile::{Experience, Project};

pub type ResultMap = HashMap<FieldCoordinate, AdaptationResult>;

#[derive(Debug, Clone, PartialEq)]
pub struct Reconstruction {
    pub experiences: Vec<Experience>,
    /// Label → note, one per experience whose description changed.
    pub notes: BTreeMap<String, String>,
}

pub fn reconstruct(experiences: &[Experience], results: &ResultMap) -> Reconstruction {
    let mut notes = BTreeMap::new();

    let rebuilt = experiences
        .iter()
        .enumerate()
        .map(|(exp_idx, experience)| {
            let description = resolve(
                results,
                FieldCoordinate::ExperienceDescription {
                    experience: exp_idx,
                },
                &experience.description,
            );

            if description != experience.description {
                let label = unique_label(employer_label(experience), &notes);
                notes.insert(
                    label,
                    format!(
                        "Reworded the {} description to match the target role's vocabulary.",
                        experience.title
                    ),
                );
            }

            let projects = experience
                .projects
                .iter()
                .enumerate()
                .map(|(proj_idx, project)| rebuild_project(results, exp_idx, proj_idx, project))
                .collect();

            Experience {
                title: experience.title.clone(),
                company: experience.company.clone(),
                start_date: experience.start_date.clone(),
                end_date: experience.end_date.clone(),
                location: experience.location.clone(),
                description,
                projects,
            }
        })
        .collect();

    Reconstruction {
        experiences: rebuilt,
        notes,
    }
}

fn rebuild_project(
    results: &ResultMap,
    experience: usize,
    project_idx: usize,
    project: &Project,
) -> Project {
    let description = resolve(
        results,
        FieldCoordinate::ProjectDescription {
            experience,
            project: project_idx,
        },
        &project.description,
    );

    let highlights = project
        .highlights
        .iter()
        .enumerate()
        .map(|(highlight, text)| {
            resolve(
                results,
                FieldCoordinate::Highlight {
                    experience,
                    project: project_idx,
                    highlight,
                },
                text,
            )
        })
        .collect();

    Project {
        name: project.name.clone(),
        description,
        highlights,
        technologies: project.technologies.clone(),
        url: project.url.clone(),
    }
}

/// Adapted text when a result exists for `coordinate`, the original otherwise.
fn resolve(results: &ResultMap, coordinate: FieldCoordinate, original: &str) -> String {
    results
        .get(&coordinate)
        .map(|r| r.adapted.clone())
        .unwrap_or_else(|| original.to_string())
}

fn employer_label(experience: &Experience) -> &str {
    let company = experience.company.trim();
    if company.is_empty() {
        experience.title.trim()
    } else {
        company
    }
}

/// First label not yet used in `notes`: `base`, then `base (2)`, `base (3)`, ...
/// A real company name that already looks suffixed is skipped over too.
fn unique_label(base: &str, notes: &BTreeMap<String, String>) -> String {
    if !notes.contains_key(base) {
        return base.to_string();
    }
    let mut n = 2;
    loop {
        let candidate = format!("{base} ({n})");
        if !notes.contains_key(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
