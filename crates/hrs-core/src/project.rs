//! Projects and the directory they are read from.

use std::collections::BTreeMap;
use std::convert::Infallible;

use serde::{Deserialize, Serialize};

use crate::types::{Money, ProjectId, ValidationError};

/// A billing context: who the work is for and what it pays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub client: String,
    /// Current hourly rate. Entries copy it when they are created.
    pub hourly_rate: Money,
}

impl Project {
    /// Builds a project, rejecting an empty name or a negative rate.
    pub fn new(
        id: ProjectId,
        name: impl Into<String>,
        client: impl Into<String>,
        hourly_rate: Money,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::Empty {
                field: "project name",
            });
        }
        Ok(Self {
            id,
            name,
            client: client.into(),
            hourly_rate: hourly_rate.validate_rate()?,
        })
    }
}

/// Read access to the projects a user can book time against.
pub trait ProjectDirectory {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Looks up a single project.
    fn project(&self, id: &ProjectId) -> Result<Option<Project>, Self::Error>;

    /// Lists all projects ordered by ID.
    fn projects(&self) -> Result<Vec<Project>, Self::Error>;
}

impl<T: ProjectDirectory + ?Sized> ProjectDirectory for &T {
    type Error = T::Error;

    fn project(&self, id: &ProjectId) -> Result<Option<Project>, Self::Error> {
        (**self).project(id)
    }

    fn projects(&self) -> Result<Vec<Project>, Self::Error> {
        (**self).projects()
    }
}

/// In-memory project directory.
#[derive(Debug, Clone, Default)]
pub struct ProjectCatalog {
    projects: BTreeMap<ProjectId, Project>,
}

impl ProjectCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a project, replacing any existing one with the same ID.
    ///
    /// Replacing a project with a new rate affects only entries created
    /// afterwards.
    pub fn upsert(&mut self, project: Project) {
        self.projects.insert(project.id.clone(), project);
    }
}

impl FromIterator<Project> for ProjectCatalog {
    fn from_iter<I: IntoIterator<Item = Project>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for project in iter {
            catalog.upsert(project);
        }
        catalog
    }
}

impl ProjectDirectory for ProjectCatalog {
    type Error = Infallible;

    fn project(&self, id: &ProjectId) -> Result<Option<Project>, Self::Error> {
        Ok(self.projects.get(id).cloned())
    }

    fn projects(&self) -> Result<Vec<Project>, Self::Error> {
        Ok(self.projects.values().cloned().collect())
    }
}
