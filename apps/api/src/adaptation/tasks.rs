//! Task Collector: flattens a nested profile into coordinate-tagged rewrite tasks.

use std::fmt;

use crate::adaptation::adapter::ContentCategory;
use crate::models::profile::Experience;

/// Location of one adaptable text field inside the nested profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldCoordinate {
    ExperienceDescription {
        experience: usize,
    },
    ProjectDescription {
        experience: usize,
        project: usize,
    },
    Highlight {
        experience: usize,
        project: usize,
        highlight: usize,
    },
}

impl FieldCoordinate {
    pub fn category(self) -> ContentCategory {
        match self {
            FieldCoordinate::ExperienceDescription { .. } => ContentCategory::ExperienceDescription,
            FieldCoordinate::ProjectDescription { .. } => ContentCategory::ProjectDescription,
            FieldCoordinate::Highlight { .. } => ContentCategory::BulletPoint,
        }
    }
}

impl fmt::Display for FieldCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldCoordinate::ExperienceDescription { experience } => {
                write!(f, "experiences[{experience}].description")
            }
            FieldCoordinate::ProjectDescription {
                experience,
                project,
            } => write!(f, "experiences[{experience}].projects[{project}].description"),
            FieldCoordinate::Highlight {
                experience,
                project,
                highlight,
            } => write!(
                f,
                "experiences[{experience}].projects[{project}].highlights[{highlight}]"
            ),
        }
    }
}

/// One independent rewrite job.
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptationTask {
    pub coordinate: FieldCoordinate,
    pub original: String,
}

/// Collects one task per non-blank adaptable field, in input nesting order:
/// experience description, then for each project its description followed by
/// its highlights.
pub fn collect_tasks(experiences: &[Experience]) -> Vec<AdaptationTask> {
    let mut tasks = Vec::new();

    for (exp_idx, experience) in experiences.iter().enumerate() {
        push_if_present(
            &mut tasks,
            FieldCoordinate::ExperienceDescription {
                experience: exp_idx,
            },
            &experience.description,
        );

        for (proj_idx, project) in experience.projects.iter().enumerate() {
            push_if_present(
                &mut tasks,
                FieldCoordinate::ProjectDescription {
                    experience: exp_idx,
                    project: proj_idx,
                },
                &project.description,
            );

            for (hl_idx, highlight) in project.highlights.iter().enumerate() {
                push_if_present(
                    &mut tasks,
                    FieldCoordinate::Highlight {
                        experience: exp_idx,
                        project: proj_idx,
                        highlight: hl_idx,
                    },
                    highlight,
                );
            }
        }
    }

    tasks
}

fn push_if_present(tasks: &mut Vec<AdaptationTask>, coordinate: FieldCoordinate, text: &str) {
    if !text.trim().is_empty() {
        tasks.push(AdaptationTask {
            coordinate,
            original: text.to_string(),
        });
    }
}
