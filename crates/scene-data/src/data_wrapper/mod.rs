//! Override/inheritance engine.
//!
//! A [`DataWrapper`] owns a sparse tree of local values and optionally links
//! to a base wrapper. Reading [`data`](DataWrapper::data) unions the local
//! tree over the base's merged view; writes only ever touch the local tree.
//!
//! Wrappers are cheap handles (`Rc`) and single-threaded. Own data is kept
//! behind an `Rc<Value>` that is replaced, never mutated, so identity
//! comparison is enough to memoize merged views.
//!
//! Notification is synchronous and re-entrant: a listener that writes to a
//! wrapper runs the nested notification chain before returning. Nothing
//! stops a listener from writing forever.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use log::{debug, trace};
use scene_data_path::{format_path, get_in, AsPath, Path};
use serde_json::Value;

use crate::param::bound_ids;
use crate::patch::{get_patch_from_set, get_patch_from_unset, DataPatch};
use crate::schema::{update_atomic, DataSchema};

mod dependencies;
mod events;
mod lens;
mod overrides;
mod types;

pub use dependencies::DependencyRegistry;
pub use events::ListenerId;
pub use lens::{Lens, LensEntry};
pub use types::{
    DeriveOptions, OverrideState, ScopedChange, TemplateOptions, WrapperError, WrapperState,
};

use events::Notifier;

thread_local! {
    static ROOTS: RefCell<HashMap<usize, (Weak<DataSchema>, Weak<Node>)>> =
        RefCell::new(HashMap::new());
}

pub(crate) struct Node {
    schema: Rc<DataSchema>,
    registry: Rc<DependencyRegistry>,
    notifier: Notifier,
    fan_out: Cell<FanOut>,
    state: RefCell<NodeState>,
}

/// Progress of a dependent fan-out started by [`DataWrapper::notify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FanOut {
    Idle,
    Running,
    /// Another notify arrived mid-pass.
    Again,
}

struct NodeState {
    own: Rc<Value>,
    base: Option<BaseLink>,
    skip_merge: bool,
    nested: bool,
    merged: Option<MergedCache>,
    prefab_map: HashMap<String, String>,
    dependencies: Vec<Registration>,
    lenses: HashMap<String, Lens>,
    disposed: bool,
}

/// One registration in the dependency registry: the id as written in the
/// data and the key it resolved to through the prefab map.
struct Registration {
    ref_id: String,
    key: String,
}

struct BaseLink {
    wrapper: DataWrapper,
    listener: Option<ListenerId>,
}

struct MergedCache {
    own: Rc<Value>,
    base: Rc<Value>,
    merged: Rc<Value>,
}

impl Drop for Node {
    fn drop(&mut self) {
        if let Some(BaseLink {
            wrapper,
            listener: Some(id),
        }) = self.state.get_mut().base.take()
        {
            wrapper.node.notifier.unsubscribe(id);
        }
    }
}

/// Handle to one node of an inheritance chain.
#[derive(Clone)]
pub struct DataWrapper {
    pub(crate) node: Rc<Node>,
}

impl DataWrapper {
    fn with_parts(
        schema: Rc<DataSchema>,
        registry: Rc<DependencyRegistry>,
        own: Value,
        options: DeriveOptions,
    ) -> Self {
        DataWrapper {
            node: Rc::new(Node {
                schema,
                registry,
                notifier: Notifier::new(),
                fan_out: Cell::new(FanOut::Idle),
                state: RefCell::new(NodeState {
                    own: Rc::new(Value::Null),
                    base: None,
                    skip_merge: options.skip_merge,
                    nested: options.nested,
                    merged: None,
                    prefab_map: HashMap::new(),
                    dependencies: Vec::new(),
                    lenses: HashMap::new(),
                    disposed: false,
                }),
            }),
        }
        .seeded(own)
    }

    fn seeded(self, own: Value) -> Self {
        self.store(Rc::new(own));
        self
    }

    /// The shared root for `schema`, seeded with its default data.
    ///
    /// One root is cached per schema while something still holds it.
    pub fn get_base(schema: &Rc<DataSchema>) -> DataWrapper {
        let key = Rc::as_ptr(schema) as usize;
        let cached = ROOTS.with(|roots| {
            roots.borrow().get(&key).and_then(|(schema_ref, node)| {
                (schema_ref.strong_count() > 0)
                    .then(|| node.upgrade())
                    .flatten()
            })
        });
        if let Some(node) = cached {
            return DataWrapper { node };
        }
        let root = DataWrapper::root(Rc::clone(schema), schema.get_default_data());
        ROOTS.with(|roots| {
            let mut roots = roots.borrow_mut();
            roots.retain(|_, (schema_ref, node)| {
                schema_ref.strong_count() > 0 && node.strong_count() > 0
            });
            roots.insert(key, (Rc::downgrade(schema), Rc::downgrade(&root.node)));
        });
        root
    }

    /// An uncached root holding `data`, registered in the thread's global
    /// dependency registry.
    pub fn root(schema: Rc<DataSchema>, data: Value) -> DataWrapper {
        Self::root_with_registry(schema, DependencyRegistry::global(), data)
    }

    pub fn root_with_registry(
        schema: Rc<DataSchema>,
        registry: Rc<DependencyRegistry>,
        data: Value,
    ) -> DataWrapper {
        Self::with_parts(schema, registry, data, DeriveOptions::default())
    }

    /// A new wrapper inheriting from `self`, holding `own` as its local data.
    pub fn derive(&self, own: Value, options: DeriveOptions) -> DataWrapper {
        let child = Self::with_parts(
            Rc::clone(&self.node.schema),
            Rc::clone(&self.node.registry),
            own,
            options,
        );
        child.replace_base(Some(self.clone()));
        child
    }

    pub(crate) fn replace_base(&self, base: Option<DataWrapper>) {
        let previous = self.node.state.borrow_mut().base.take();
        if let Some(BaseLink {
            wrapper,
            listener: Some(id),
        }) = previous
        {
            wrapper.node.notifier.unsubscribe(id);
        }
        let disposed = self.is_disposed();
        let link = base.map(|wrapper| {
            let listener = (!disposed).then(|| {
                let child = Rc::downgrade(&self.node);
                wrapper.node.notifier.subscribe(Rc::new(move || {
                    if let Some(node) = child.upgrade() {
                        DataWrapper { node }.notify();
                    }
                }))
            });
            BaseLink { wrapper, listener }
        });
        let mut state = self.node.state.borrow_mut();
        state.base = link;
        state.merged = None;
    }

    pub fn schema(&self) -> Rc<DataSchema> {
        Rc::clone(&self.node.schema)
    }

    pub fn registry(&self) -> Rc<DependencyRegistry> {
        Rc::clone(&self.node.registry)
    }

    pub fn base(&self) -> Option<DataWrapper> {
        self.node
            .state
            .borrow()
            .base
            .as_ref()
            .map(|link| link.wrapper.clone())
    }

    pub fn is_root(&self) -> bool {
        self.node.state.borrow().base.is_none()
    }

    /// Two or more levels of inheritance: the base itself has a base.
    pub fn is_derived(&self) -> bool {
        self.base().is_some_and(|base| !base.is_root())
    }

    pub fn nested(&self) -> bool {
        self.node.state.borrow().nested
    }

    pub fn skips_merge(&self) -> bool {
        self.node.state.borrow().skip_merge
    }

    pub fn is_disposed(&self) -> bool {
        self.node.state.borrow().disposed
    }

    pub fn ptr_eq(&self, other: &DataWrapper) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }

    /// Local values only.
    pub fn own_data(&self) -> Rc<Value> {
        Rc::clone(&self.node.state.borrow().own)
    }

    /// Local values unioned over the base's merged view.
    ///
    /// Recomputed only when the identity of the local tree or of the base's
    /// view changed since the last read.
    pub fn data(&self) -> Rc<Value> {
        let (own, base) = {
            let state = self.node.state.borrow();
            let base = match &state.base {
                Some(link) if !state.skip_merge => link.wrapper.clone(),
                _ => return Rc::clone(&state.own),
            };
            (Rc::clone(&state.own), base)
        };
        let base_data = base.data();
        if let Some(cache) = &self.node.state.borrow().merged {
            if Rc::ptr_eq(&cache.own, &own) && Rc::ptr_eq(&cache.base, &base_data) {
                return Rc::clone(&cache.merged);
            }
        }
        let merged = Rc::new(self.node.schema.union(&own, &base_data));
        self.node.state.borrow_mut().merged = Some(MergedCache {
            own,
            base: base_data,
            merged: Rc::clone(&merged),
        });
        merged
    }

    /// Reads from the local tree.
    pub fn get(&self, path: impl AsPath) -> Option<Value> {
        get_in(&self.own_data(), &path.as_path()).cloned()
    }

    /// Reads from the merged view.
    pub fn get_merged(&self, path: impl AsPath) -> Option<Value> {
        get_in(&self.data(), &path.as_path()).cloned()
    }

    /// The instance id: the merged `id` field when it is a string.
    pub fn id(&self) -> Option<String> {
        match self.get_merged("id") {
            Some(Value::String(id)) => Some(id),
            _ => None,
        }
    }

    pub fn set(&self, path: impl AsPath, value: Value) -> Result<(), WrapperError> {
        self.set_with(path, value, true)
    }

    pub fn set_without_notify(&self, path: impl AsPath, value: Value) -> Result<(), WrapperError> {
        self.set_with(path, value, false)
    }

    /// Writes `value` into the local tree.
    ///
    /// A path below a registered value path rewrites the whole value: it is
    /// copied from the local tree (or the merged view when not overridden
    /// yet), edited and written back as one unit.
    pub fn set_with(
        &self,
        path: impl AsPath,
        value: Value,
        notify: bool,
    ) -> Result<(), WrapperError> {
        let path = path.as_path();
        let own = self.own_data();
        let schema = &self.node.schema;
        let next = match self.atomic_split(&path) {
            Some((prefix, inner)) => {
                let whole = self.atomic_source(&own, prefix);
                schema.set(&own, prefix, update_atomic(whole, inner, Some(value))?)?
            }
            None => schema.set(&own, &path, value)?,
        };
        self.commit(next, notify);
        Ok(())
    }

    /// Writes `value` as an override only when it differs from what the
    /// base provides; otherwise drops the local override.
    pub fn set_merged(&self, path: impl AsPath, value: Value) -> Result<(), WrapperError> {
        let path = path.as_path();
        let inherited = self
            .base()
            .and_then(|base| get_in(&base.data(), &path).cloned());
        match inherited {
            Some(inherited) if self.node.schema.equals(&inherited, &value) => self.unset(&path),
            _ => self.set(&path, value),
        }
    }

    pub fn unset(&self, path: impl AsPath) -> Result<(), WrapperError> {
        self.unset_many([path])
    }

    /// Removes every path from the local tree with a single notification.
    pub fn unset_many<I, P>(&self, paths: I) -> Result<(), WrapperError>
    where
        I: IntoIterator<Item = P>,
        P: AsPath,
    {
        let schema = &self.node.schema;
        let mut next = (*self.own_data()).clone();
        for path in paths {
            let path = path.as_path();
            next = match self.atomic_split(&path) {
                Some((prefix, inner)) => match self.atomic_source(&next, prefix) {
                    Some(whole) => {
                        schema.set(&next, prefix, update_atomic(Some(whole), inner, None)?)?
                    }
                    None => next,
                },
                None => schema.unset(&next, &path)?,
            };
        }
        self.commit(next, true);
        Ok(())
    }

    /// Merges `data` into the local tree; incoming leaves win.
    pub fn assign(&self, data: &Value) {
        let next = self.node.schema.assign(&self.own_data(), data);
        self.commit(next, true);
    }

    /// Merges `data` into the local tree without overwriting local leaves.
    pub fn union(&self, data: &Value) {
        let next = self.node.schema.union(&self.own_data(), data);
        self.commit(next, true);
    }

    fn atomic_split<'p>(&self, path: &'p [String]) -> Option<(&'p [String], &'p [String])> {
        match self.node.schema.find_value_prefix(path) {
            Some(len) if len < path.len() => Some(path.split_at(len)),
            _ => None,
        }
    }

    fn atomic_source(&self, own: &Value, prefix: &[String]) -> Option<Value> {
        get_in(own, prefix)
            .filter(|v| !v.is_null())
            .cloned()
            .or_else(|| get_in(&self.data(), prefix).cloned())
    }

    pub(crate) fn commit(&self, next: Value, notify: bool) {
        if *self.own_data() == next {
            return;
        }
        self.store(Rc::new(next));
        if notify {
            self.notify();
        }
    }

    /// Swaps in `next` by reference, keeping binding registrations in step.
    pub(crate) fn store(&self, next: Rc<Value>) {
        let prev = self.own_data();
        if Rc::ptr_eq(&prev, &next) {
            return;
        }
        if !self.is_disposed() {
            self.sync_bindings(&prev, &next);
        }
        self.node.state.borrow_mut().own = next;
    }

    fn sync_bindings(&self, prev: &Value, next: &Value) {
        let mut stale = bound_ids(prev);
        let mut added = Vec::new();
        for id in bound_ids(next) {
            match stale.iter().position(|old| *old == id) {
                Some(idx) => {
                    stale.swap_remove(idx);
                }
                None => added.push(id),
            }
        }
        for id in &stale {
            self.remove_from_dependencies(id);
        }
        for id in &added {
            self.add_to_dependencies(id);
        }
    }

    /// Replaces the prefab-local id map. Registrations made under the old
    /// map move to the keys their ids resolve to now.
    pub fn set_prefab_map(&self, map: HashMap<String, String>) {
        let moved: Vec<(String, String)> = {
            let mut state = self.node.state.borrow_mut();
            state.prefab_map = map;
            let NodeState {
                prefab_map,
                dependencies,
                ..
            } = &mut *state;
            dependencies
                .iter_mut()
                .filter_map(|reg| {
                    let key = prefab_map
                        .get(&reg.ref_id)
                        .cloned()
                        .unwrap_or_else(|| reg.ref_id.clone());
                    (key != reg.key).then(|| (std::mem::replace(&mut reg.key, key.clone()), key))
                })
                .collect()
        };
        for (old, new) in &moved {
            self.node.registry.remove(old, &self.node);
            self.node.registry.add(new, &self.node);
            trace!("dependency moved from {old} to {new}");
        }
    }

    pub fn prefab_map(&self) -> HashMap<String, String> {
        self.node.state.borrow().prefab_map.clone()
    }

    /// Resolves a prefab-local id to this instance's concrete id.
    pub fn get_ref_id(&self, id: &str) -> String {
        self.node
            .state
            .borrow()
            .prefab_map
            .get(id)
            .cloned()
            .unwrap_or_else(|| id.to_owned())
    }

    /// Registers this wrapper as a dependent of the instance `ref_id`.
    pub fn add_to_dependencies(&self, ref_id: &str) {
        let key = self.get_ref_id(ref_id);
        self.node.registry.add(&key, &self.node);
        self.node.state.borrow_mut().dependencies.push(Registration {
            ref_id: ref_id.to_owned(),
            key,
        });
    }

    /// Drops one registration made for `ref_id`. A resolved id is accepted
    /// too.
    pub fn remove_from_dependencies(&self, ref_id: &str) {
        let removed = {
            let mut state = self.node.state.borrow_mut();
            let idx = state
                .dependencies
                .iter()
                .position(|reg| reg.ref_id == ref_id)
                .or_else(|| state.dependencies.iter().position(|reg| reg.key == ref_id));
            idx.map(|idx| state.dependencies.remove(idx))
        };
        if let Some(reg) = removed {
            self.node.registry.remove(&reg.key, &self.node);
        }
    }

    /// Ids this wrapper is currently registered against, one per registration.
    pub fn dependencies(&self) -> Vec<String> {
        self.node
            .state
            .borrow()
            .dependencies
            .iter()
            .map(|reg| reg.key.clone())
            .collect()
    }

    /// Runs local listeners, then the local listeners of every wrapper
    /// registered as depending on this wrapper's id.
    ///
    /// Dependents are not asked to propagate further. A notify raised by a
    /// dependent's listener while the fan-out is still running restarts it
    /// once the current pass ends, so every dependent ends up having seen the
    /// latest state. While paused, the call is swallowed.
    pub fn notify(&self) {
        if !self.node.notifier.emit() {
            return;
        }
        if self.node.fan_out.get() != FanOut::Idle {
            self.node.fan_out.set(FanOut::Again);
            return;
        }
        loop {
            self.node.fan_out.set(FanOut::Running);
            let Some(id) = self.id() else {
                break;
            };
            for dependent in self.node.registry.dependents(&id) {
                if !dependent.ptr_eq(self) {
                    dependent.node.notifier.emit();
                }
            }
            if self.node.fan_out.get() != FanOut::Again {
                break;
            }
            trace!("re-running fan-out of {id}");
        }
        self.node.fan_out.set(FanOut::Idle);
    }

    pub fn on_change<F>(&self, listener: F) -> ListenerId
    where
        F: Fn() + 'static,
    {
        self.node.notifier.subscribe(Rc::new(listener))
    }

    pub fn off_change(&self, listener_id: ListenerId) -> bool {
        self.node.notifier.unsubscribe(listener_id)
    }

    /// Fires only when the merged value at `path` differs from what it was
    /// at the previous notification.
    pub fn on_change_at<P, F>(&self, path: P, listener: F) -> ListenerId
    where
        P: AsPath,
        F: Fn(&ScopedChange) + 'static,
    {
        let path = path.as_path();
        let last = RefCell::new(get_in(&self.data(), &path).cloned());
        let node = Rc::downgrade(&self.node);
        self.on_change(move || {
            let Some(node) = node.upgrade() else {
                return;
            };
            let after = get_in(&DataWrapper { node }.data(), &path).cloned();
            let before = last.replace(after.clone());
            if before != after {
                listener(&ScopedChange {
                    path: path.clone(),
                    before,
                    after,
                });
            }
        })
    }

    pub fn listener_count(&self) -> usize {
        self.node.notifier.len()
    }

    /// Swallows notifications until the matching resume. Pauses nest.
    pub fn pause_notifications(&self) {
        self.node.notifier.pause();
    }

    /// Leaves one pause level. Once no pause is left and `notify_on_resume`
    /// is set, one catch-up notification fires.
    pub fn resume_notifications(&self, notify_on_resume: bool) {
        if self.node.notifier.resume() && notify_on_resume {
            self.notify();
        }
    }

    pub fn notifications_paused(&self) -> bool {
        self.node.notifier.is_paused()
    }

    /// `true` while paused with at least one swallowed notification.
    pub fn has_pending_notification(&self) -> bool {
        self.node.notifier.has_pending()
    }

    /// Detaches from the base's notifications, drops every listener and lens
    /// and unregisters all dependencies. A second call does nothing.
    pub fn dispose(&self) {
        let (base_listener, dependencies) = {
            let mut state = self.node.state.borrow_mut();
            if state.disposed {
                return;
            }
            state.disposed = true;
            state.lenses.clear();
            let base_listener = state.base.as_mut().and_then(|link| {
                link.listener
                    .take()
                    .map(|id| (link.wrapper.clone(), id))
            });
            (base_listener, std::mem::take(&mut state.dependencies))
        };
        if let Some((base, id)) = base_listener {
            base.node.notifier.unsubscribe(id);
        }
        for reg in &dependencies {
            self.node.registry.remove(&reg.key, &self.node);
        }
        self.node.notifier.clear();
        debug!(
            "disposed data wrapper {} ({} dependencies released)",
            self.id().unwrap_or_default(),
            dependencies.len()
        );
    }

    /// Sets `path` and returns the patch that describes the change.
    pub fn set_tracked(&self, path: impl AsPath, value: Value) -> Result<DataPatch, WrapperError> {
        let path = path.as_path();
        let prev = self.get(&path);
        self.set(&path, value.clone())?;
        Ok(get_patch_from_set(path, value, prev))
    }

    /// Unsets `path`; `None` when nothing was stored there.
    pub fn unset_tracked(&self, path: impl AsPath) -> Result<Option<DataPatch>, WrapperError> {
        let path = path.as_path();
        let Some(prev) = self.get(&path) else {
            return Ok(None);
        };
        self.unset(&path)?;
        Ok(Some(get_patch_from_unset(path, prev)))
    }

    /// Replays a patch (or, for undo, its inverse) against the local tree.
    pub fn apply_patch(&self, patch: &DataPatch) -> Result<(), WrapperError> {
        match patch {
            DataPatch::Add { path, value } | DataPatch::Replace { path, value, .. } => {
                self.set(path, value.clone())
            }
            DataPatch::Remove { path, .. } => self.unset(path),
        }
    }

    /// Live view over the merged data.
    pub fn lens(&self) -> Lens {
        self.lens_at(Path::new())
    }

    /// Live view scoped to `path`; one lens per path is kept until disposal.
    pub fn lens_at(&self, path: impl AsPath) -> Lens {
        let path = path.as_path();
        let key = format_path(&path);
        if let Some(lens) = self.node.state.borrow().lenses.get(&key) {
            return lens.clone();
        }
        let lens = Lens::new(Rc::downgrade(&self.node), path);
        let mut state = self.node.state.borrow_mut();
        if !state.disposed {
            state.lenses.insert(key, lens.clone());
        }
        lens
    }
}

impl std::fmt::Debug for DataWrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.node.state.borrow();
        f.debug_struct("DataWrapper")
            .field("own", &state.own)
            .field("has_base", &state.base.is_some())
            .field("skip_merge", &state.skip_merge)
            .field("nested", &state.nested)
            .field("disposed", &state.disposed)
            .finish()
    }
}
