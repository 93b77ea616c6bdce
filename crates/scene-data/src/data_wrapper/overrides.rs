//! Override management: the local leaves of an instance that shadow its base.
//!
//! Every query here is tolerant on a root wrapper and answers "nothing".

use std::rc::Rc;

use log::debug;
use scene_data_path::{get_in, write, AsPath, Path};
use scene_data_util::is_empty_object;
use serde_json::Value;

use super::{DataWrapper, DeriveOptions, OverrideState, TemplateOptions, WrapperError, WrapperState};

/// Fields copied into template data even though they are instance fields.
const TEMPLATE_FIELDS: &[&str] = &["type", "name", "prefabId"];

impl DataWrapper {
    /// `true` when `path` holds a local, non-proper leaf value.
    pub fn is_override(&self, path: impl AsPath) -> bool {
        if self.is_root() {
            return false;
        }
        let path = path.as_path();
        let schema = &self.node.schema;
        !schema.is_proper(&path, self.nested())
            && get_in(&self.own_data(), &path)
                .is_some_and(|value| !value.is_null() && schema.is_value(value, &path))
    }

    /// Local leaf paths that are not proper paths.
    fn override_paths(&self, prefixes: Option<Vec<Path>>) -> Vec<Path> {
        if self.is_root() {
            return Vec::new();
        }
        let schema = &self.node.schema;
        let own = self.own_data();
        let nested = self.nested();
        let leaves = match prefixes {
            Some(prefixes) => schema.expand_paths(&own, prefixes),
            None => schema.leaf_path_steps(&own),
        };
        leaves
            .into_iter()
            .filter(|path| !schema.is_proper(path, nested))
            .filter(|path| get_in(&own, path).is_some_and(|v| !v.is_null()))
            .collect()
    }

    pub fn has_overrides(&self) -> bool {
        !self.override_paths(None).is_empty()
    }

    /// Any override at, below or enclosing one of `paths`.
    pub fn has_overrides_at<I, P>(&self, paths: I) -> bool
    where
        I: IntoIterator<Item = P>,
        P: AsPath,
    {
        !self.override_paths(Some(collect_paths(paths))).is_empty()
    }

    /// Local data without proper paths.
    pub fn get_overrides(&self) -> Value {
        self.overrides_for(None)
    }

    pub fn get_overrides_at<I, P>(&self, paths: I) -> Value
    where
        I: IntoIterator<Item = P>,
        P: AsPath,
    {
        self.overrides_for(Some(collect_paths(paths)))
    }

    fn overrides_for(&self, prefixes: Option<Vec<Path>>) -> Value {
        let paths = self.override_paths(prefixes);
        self.node.schema.only_paths(&self.own_data(), &paths)
    }

    /// Drops every override and returns what was removed.
    pub fn remove_overrides(&self) -> Value {
        self.remove_overrides_for(None)
    }

    pub fn remove_overrides_at<I, P>(&self, paths: I) -> Value
    where
        I: IntoIterator<Item = P>,
        P: AsPath,
    {
        self.remove_overrides_for(Some(collect_paths(paths)))
    }

    fn remove_overrides_for(&self, prefixes: Option<Vec<Path>>) -> Value {
        let removed = self.overrides_for(prefixes);
        if is_empty_object(&removed) {
            return removed;
        }
        let next = self.node.schema.substract(&self.own_data(), &removed);
        self.commit(next, true);
        removed
    }

    /// Pushes every override down into the base.
    ///
    /// Returns `None` on a root or when there is nothing to push.
    pub fn apply_overrides(&self) -> Option<OverrideState> {
        self.apply_overrides_for(None)
    }

    pub fn apply_overrides_at<I, P>(&self, paths: I) -> Option<OverrideState>
    where
        I: IntoIterator<Item = P>,
        P: AsPath,
    {
        self.apply_overrides_for(Some(collect_paths(paths)))
    }

    fn apply_overrides_for(&self, prefixes: Option<Vec<Path>>) -> Option<OverrideState> {
        let base = self.base()?;
        let applied = self.overrides_for(prefixes);
        if is_empty_object(&applied) {
            return None;
        }
        let own_before = self.own_data();
        let base_own_before = base.own_data();
        self.pause_notifications();
        base.assign(&applied);
        self.commit(self.node.schema.substract(&own_before, &applied), true);
        self.resume_notifications(true);
        debug!(
            "applied {} override(s) to base",
            self.node.schema.leaf_paths(&applied).len()
        );
        Some(OverrideState {
            owner: Rc::downgrade(&self.node),
            base,
            own_before,
            base_own_before,
            applied,
        })
    }

    /// Reverts [`apply_overrides`](Self::apply_overrides), restoring the
    /// exact local and base trees it replaced.
    pub fn unapply_overrides(&self, state: &OverrideState) -> Result<(), WrapperError> {
        if !std::ptr::eq(state.owner.as_ptr(), Rc::as_ptr(&self.node)) {
            return Err(WrapperError::InvalidOverrideState(
                "state was produced by another wrapper".to_owned(),
            ));
        }
        if !self.base().is_some_and(|base| base.ptr_eq(&state.base)) {
            return Err(WrapperError::InvalidOverrideState(
                "base changed since the overrides were applied".to_owned(),
            ));
        }
        self.pause_notifications();
        state.base.restore_own(Rc::clone(&state.base_own_before));
        self.restore_own(Rc::clone(&state.own_before));
        self.resume_notifications(true);
        Ok(())
    }

    fn restore_own(&self, own: Rc<Value>) {
        if Rc::ptr_eq(&self.own_data(), &own) {
            return;
        }
        self.store(own);
        self.notify();
    }

    /// Local data minus instance fields, keeping `type`, `name` and
    /// `prefabId` when they are set.
    pub fn get_template_data(&self, options: TemplateOptions) -> Value {
        let schema = &self.node.schema;
        let nested = options.nested.unwrap_or_else(|| self.nested());
        let mut template = schema.without_paths(&self.own_data(), schema.get_proper_paths(nested));
        let data = self.data();
        for field in TEMPLATE_FIELDS {
            let path = field.as_path();
            if let Some(value) = get_in(&data, &path).filter(|v| !v.is_null()) {
                write(&mut template, &path, value.clone());
            }
        }
        template
    }

    /// Moves the non-proper local fields into a new wrapper that becomes the
    /// base of `self`. The merged view does not change.
    pub fn make_prefab(&self) -> DataWrapper {
        let schema = &self.node.schema;
        let proper = schema.get_proper_paths(self.nested());
        let own = self.own_data();
        let template = schema.without_paths(&own, &proper);
        let kept = schema.only_paths(&own, &proper);
        let prefab = match self.base() {
            Some(base) => base.derive(template, DeriveOptions::new()),
            None => DataWrapper::root_with_registry(self.schema(), self.registry(), template),
        };
        self.replace_base(Some(prefab.clone()));
        self.commit(kept, false);
        self.notify();
        debug!("promoted {} to prefab", self.id().unwrap_or_default());
        prefab
    }

    /// Re-parents onto `base`, dropping everything but proper fields.
    pub fn rebase(&self, base: &DataWrapper) {
        let schema = &self.node.schema;
        let kept = schema.only_paths(&self.own_data(), schema.get_proper_paths(self.nested()));
        self.replace_base(Some(base.clone()));
        self.commit(kept, false);
        self.notify();
        debug!("rebased {}", self.id().unwrap_or_default());
    }

    /// Folds the base's local data into `self` and links to the base's base.
    pub fn detach(&self) {
        let Some(base) = self.base() else {
            return;
        };
        let next = self.node.schema.union(&self.own_data(), &base.own_data());
        self.replace_base(base.base());
        self.commit(next, false);
        self.notify();
        debug!("detached {} from its base", self.id().unwrap_or_default());
    }

    /// Captures the base link and local tree by reference.
    pub fn save_state(&self) -> WrapperState {
        WrapperState {
            base: self.base(),
            own: self.own_data(),
        }
    }

    pub fn restore_state(&self, state: &WrapperState) {
        let same_base = match (self.base(), &state.base) {
            (Some(current), Some(saved)) => current.ptr_eq(saved),
            (None, None) => true,
            _ => false,
        };
        if !same_base {
            self.replace_base(state.base.clone());
        }
        self.store(Rc::clone(&state.own));
        self.notify();
    }
}

fn collect_paths<I, P>(paths: I) -> Vec<Path>
where
    I: IntoIterator<Item = P>,
    P: AsPath,
{
    paths.into_iter().map(|p| p.as_path()).collect()
}
