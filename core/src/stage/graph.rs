use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::error::GraphError;

use super::kind::{PrerequisiteInfo, ScriptContext};
use super::sentinel::sentinel_exists;
use super::{Stage, StageId, StageKind};

/// Arena of stages; edges refer to stages by [`StageId`] and never own them.
#[derive(Debug, Clone, Default)]
pub struct StageGraph {
    stages: Vec<Stage>,
}

impl StageGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_stage(&mut self, stage: Stage) -> StageId {
        self.stages.push(stage);
        StageId(self.stages.len() - 1)
    }

    /// Add a behaviourless join point, always considered complete.
    pub fn add_root(&mut self) -> StageId {
        self.add_stage(Stage::new("root", StageKind::RootMarker))
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = StageId> {
        (0..self.stages.len()).map(StageId)
    }

    pub fn get(&self, id: StageId) -> Option<&Stage> {
        self.stages.get(id.0)
    }

    pub fn get_mut(&mut self, id: StageId) -> Option<&mut Stage> {
        self.stages.get_mut(id.0)
    }

    pub fn stage(&self, id: StageId) -> Result<&Stage, GraphError> {
        self.get(id).ok_or(GraphError::UnknownStage(id.0))
    }

    pub fn stage_mut(&mut self, id: StageId) -> Result<&mut Stage, GraphError> {
        self.stages
            .get_mut(id.0)
            .ok_or(GraphError::UnknownStage(id.0))
    }

    pub fn find_by_name(&self, name: &str) -> Option<StageId> {
        self.stages
            .iter()
            .position(|s| s.name() == name)
            .map(StageId)
    }

    /// Make `prereq` a prerequisite of `stage` and `stage` a dependent of
    /// `prereq`. Duplicate edges are ignored; an edge that would close a cycle
    /// is rejected and the graph is left unchanged.
    pub fn add_prerequisite(&mut self, stage: StageId, prereq: StageId) -> Result<(), GraphError> {
        self.stage(stage)?;
        self.stage(prereq)?;

        if stage == prereq {
            return Err(GraphError::SelfDependency(self.stages[stage.0].name().to_string()));
        }
        if self.stages[stage.0].prerequisites.contains(&prereq) {
            return Ok(());
        }
        // prereq must not already (transitively) depend on stage
        if let Some(path) = self.dependency_path(prereq, stage) {
            let mut names: Vec<&str> = path.iter().map(|id| self.stages[id.0].name()).collect();
            names.push(self.stages[prereq.0].name());
            return Err(GraphError::CircularDependency(format_cycle_path(&names)));
        }

        self.stages[stage.0].prerequisites.push(prereq);
        self.stages[prereq.0].dependents.push(stage);
        Ok(())
    }

    /// Path `from -> ... -> to` following prerequisite edges, if one exists.
    fn dependency_path(&self, from: StageId, to: StageId) -> Option<Vec<StageId>> {
        let mut visited = HashSet::new();
        let mut stack = Vec::new();
        if self.dfs_path(from, to, &mut visited, &mut stack) {
            Some(stack)
        } else {
            None
        }
    }

    fn dfs_path(
        &self,
        node: StageId,
        target: StageId,
        visited: &mut HashSet<StageId>,
        stack: &mut Vec<StageId>,
    ) -> bool {
        visited.insert(node);
        stack.push(node);
        if node == target {
            return true;
        }
        for dep in &self.stages[node.0].prerequisites {
            if !visited.contains(dep) && self.dfs_path(*dep, target, visited, stack) {
                return true;
            }
        }
        stack.pop();
        false
    }

    /// Sentinel present in the stage's working directory and every
    /// prerequisite complete. Root markers are always complete.
    pub fn is_completed(&self, id: StageId) -> bool {
        let mut memo = HashMap::new();
        self.completed_inner(id, &mut memo)
    }

    /// `memo` holds the verdict for every stage already checked in this call,
    /// so shared prerequisites are looked at once. A stage is entered as
    /// incomplete before its prerequisites are visited, which also ends any
    /// cycle.
    fn completed_inner(&self, id: StageId, memo: &mut HashMap<StageId, bool>) -> bool {
        if let Some(done) = memo.get(&id) {
            return *done;
        }
        let Some(stage) = self.get(id) else {
            return false;
        };
        memo.insert(id, false);
        let own = stage.is_root()
            || stage
                .sentinel_path()
                .map(|p| sentinel_exists(&p))
                .unwrap_or(false);
        let done = own
            && stage
                .prerequisites
                .iter()
                .all(|p| self.completed_inner(*p, memo));
        memo.insert(id, done);
        done
    }

    /// Every stage reachable from `root` through dependent edges, in
    /// depth-first discovery order (root first).
    pub fn reachable_from(&self, root: StageId) -> Vec<StageId> {
        let mut seen = HashSet::new();
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if id.0 >= self.stages.len() || !seen.insert(id) {
                continue;
            }
            order.push(id);
            // reversed so the first dependent is visited first
            for dep in self.stages[id.0].dependents.iter().rev() {
                if !seen.contains(dep) {
                    stack.push(*dep);
                }
            }
        }
        order
    }

    /// Kahn's algorithm over the (stage, dependent) edges among `ids`.
    ///
    /// Stages in the same level have no ordering constraint between them;
    /// within a level they are ordered by id so a run is reproducible.
    ///
    /// # Time Complexity
    ///
    /// O(V + E) where V = number of stages, E = number of edges
    pub fn topological_levels(&self, ids: &[StageId]) -> Result<Vec<Vec<StageId>>, GraphError> {
        let members: HashSet<StageId> = ids.iter().copied().collect();
        let mut in_degree: HashMap<StageId, usize> = HashMap::new();

        for id in ids {
            let stage = self.stage(*id)?;
            let degree = stage
                .prerequisites
                .iter()
                .filter(|p| members.contains(p))
                .count();
            in_degree.insert(*id, degree);
        }

        let mut current: Vec<StageId> = in_degree
            .iter()
            .filter(|(_, &d)| d == 0)
            .map(|(id, _)| *id)
            .collect();
        current.sort();

        let mut levels = Vec::new();
        let mut processed = 0;

        while !current.is_empty() {
            processed += current.len();
            let mut next = Vec::new();
            for id in &current {
                for dependent in &self.stages[id.0].dependents {
                    if let Some(degree) = in_degree.get_mut(dependent) {
                        *degree -= 1;
                        if *degree == 0 {
                            next.push(*dependent);
                        }
                    }
                }
            }
            next.sort();
            levels.push(std::mem::replace(&mut current, next));
        }

        if processed != members.len() {
            return Err(GraphError::CircularDependency(
                "Unable to complete topological sort (cycle detected)".to_string(),
            ));
        }

        Ok(levels)
    }

    /// What a stage's script may know about its surroundings.
    pub fn script_context<'a>(
        &'a self,
        id: StageId,
        top_dir: &'a Path,
    ) -> Result<ScriptContext<'a>, GraphError> {
        let stage = self.stage(id)?;
        let prerequisites = stage
            .prerequisites
            .iter()
            .filter_map(|p| self.get(*p))
            .filter(|p| !p.is_root())
            .map(|p| PrerequisiteInfo {
                name: p.name(),
                declared_name: p.declared_name(),
                workdir: p.workdir(),
            })
            .collect();

        Ok(ScriptContext {
            stage_name: stage.name(),
            workdir: stage.workdir(),
            top_dir,
            prerequisites,
        })
    }

    /// Names of the non-root prerequisites of `id`, used as hold dependencies.
    pub fn prerequisite_names(&self, id: StageId) -> Vec<String> {
        self.get(id)
            .map(|s| {
                s.prerequisites
                    .iter()
                    .filter_map(|p| self.get(*p))
                    .filter(|p| !p.is_root())
                    .map(|p| p.name().to_string())
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn format_cycle_path(names: &[&str]) -> String {
    names.join(" -> ")
}
