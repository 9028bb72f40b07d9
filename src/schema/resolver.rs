//! Inheritance resolution.
//!
//! Two-pass: the raw graph keeps string-keyed references; resolution walks
//! the extends graph in topological order (base before derived, cycles
//! detected explicitly via petgraph) and materializes one immutable
//! effective definition per type. Inherited children are cloned into the
//! derived definition and marked, so nothing walks a base pointer at
//! runtime.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::debug;

use super::def::{
    CollectionDefinition, ContainedType, EmbeddedDefinition, FieldDefinition, FieldShape,
    PicklistDefinition, PicklistEntry, SectionDefinition, Settings, TypeDefinition,
};
use super::raw::{
    RawCollection, RawEmbedded, RawField, RawPicklist, RawPicklistEntry, RawSchema, RawSection,
    RawType,
};
use super::LoreSchema;
use crate::error::{SchemaError, SchemaResult};

/// Resolve a raw schema into an immutable [`LoreSchema`], or fail with the
/// first schema-semantic error found.
pub fn resolve(raw: RawSchema) -> SchemaResult<LoreSchema> {
    let type_names: HashSet<&str> = raw.types.iter().map(|t| t.name.as_str()).collect();

    check_duplicates("type", raw.types.iter().map(|t| t.name.as_str()))?;
    check_duplicates("collection", raw.collections.iter().map(|c| c.name.as_str()))?;
    check_duplicates("picklist", raw.picklists.iter().map(|p| p.name.as_str()))?;

    let picklists: HashMap<String, Arc<PicklistDefinition>> = raw
        .picklists
        .iter()
        .map(|p| (p.name.clone(), Arc::new(convert_picklist(p))))
        .collect();

    let globals = resolve_global_collections(&raw.collections, &type_names)?;

    let order = extends_order(&raw.types, &type_names)?;
    let by_name: HashMap<&str, &RawType> = raw.types.iter().map(|t| (t.name.as_str(), t)).collect();

    let mut types: HashMap<String, Arc<TypeDefinition>> = HashMap::new();
    for name in order {
        let raw_type = by_name[name.as_str()];
        let converted = convert_type(raw_type, &type_names, &globals)?;
        let effective = match &raw_type.extends {
            Some(base) => {
                let base_def = types
                    .get(base)
                    .expect("extends order guarantees base resolves first");
                merge_type(base_def, converted)
            }
            None => converted,
        };
        debug!(type_name = %effective.name, fields = effective.fields.len(), "resolved type");
        types.insert(effective.name.clone(), Arc::new(effective));
    }

    for ty in types.values() {
        check_embedded_slots(ty, &types)?;
        check_picklist_bindings(&ty.name, &ty.fields, &picklists)?;
        for section in &ty.sections {
            check_section_picklists(&ty.name, section, &picklists)?;
        }
    }

    let collections = globals
        .into_iter()
        .map(|(name, def)| (name, Arc::new(def)))
        .collect();

    let settings = Settings {
        blocked_paths: raw.settings.blocked_paths,
    };

    Ok(LoreSchema::new(types, collections, picklists, settings))
}

fn check_duplicates<'a>(
    kind: &'static str,
    names: impl Iterator<Item = &'a str>,
) -> SchemaResult<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(SchemaError::DuplicateDefinition {
                kind,
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

/// Topological order of the extends graph, base before derived. Cycles are
/// an explicit build-time failure, never a recursion limit.
fn extends_order<'a>(
    types: &'a [RawType],
    type_names: &HashSet<&str>,
) -> SchemaResult<Vec<String>> {
    let mut graph: DiGraph<&'a str, ()> = DiGraph::new();
    let mut indices: HashMap<&str, NodeIndex> = HashMap::new();
    for t in types {
        let idx = graph.add_node(t.name.as_str());
        indices.insert(t.name.as_str(), idx);
    }
    for t in types {
        if let Some(base) = &t.extends {
            if !type_names.contains(base.as_str()) {
                return Err(SchemaError::UnknownBase {
                    name: t.name.clone(),
                    base: base.clone(),
                });
            }
            graph.add_edge(indices[base.as_str()], indices[t.name.as_str()], ());
        }
    }
    match toposort(&graph, None) {
        Ok(order) => Ok(order.into_iter().map(|i| graph[i].to_string()).collect()),
        Err(cycle) => Err(SchemaError::InheritanceCycle {
            name: graph[cycle.node_id()].to_string(),
        }),
    }
}

// --- standalone collections ---

/// Resolve the globally named collections. A collection naming another
/// collection as its entry kind pulls in that definition recursively, so
/// resolution is memoized and guards against self-containment.
fn resolve_global_collections(
    raws: &[RawCollection],
    type_names: &HashSet<&str>,
) -> SchemaResult<HashMap<String, CollectionDefinition>> {
    let raw_map: HashMap<&str, &RawCollection> =
        raws.iter().map(|c| (c.name.as_str(), c)).collect();
    let mut done: HashMap<String, CollectionDefinition> = HashMap::new();
    let mut visiting: HashSet<String> = HashSet::new();
    for c in raws {
        resolve_named_collection(&c.name, &raw_map, type_names, &mut done, &mut visiting)?;
    }
    Ok(done)
}

fn resolve_named_collection(
    name: &str,
    raw_map: &HashMap<&str, &RawCollection>,
    type_names: &HashSet<&str>,
    done: &mut HashMap<String, CollectionDefinition>,
    visiting: &mut HashSet<String>,
) -> SchemaResult<CollectionDefinition> {
    if let Some(def) = done.get(name) {
        return Ok(def.clone());
    }
    if !visiting.insert(name.to_string()) {
        return Err(SchemaError::CollectionCycle {
            name: name.to_string(),
        });
    }
    let raw = raw_map[name];
    let def = convert_collection(raw, type_names, &mut |target| {
        let target_raw = raw_map.get(target).copied();
        match target_raw {
            Some(_) => resolve_named_collection(target, raw_map, type_names, done, visiting),
            None => Err(SchemaError::UnknownEntryCollection {
                name: name.to_string(),
                target: target.to_string(),
            }),
        }
    })?;
    visiting.remove(name);
    done.insert(name.to_string(), def.clone());
    Ok(def)
}

/// Convert one raw collection. `lookup_named` resolves an
/// `entry_collection_name` reference; inline anonymous nestings resolve
/// recursively and are marked local.
fn convert_collection(
    raw: &RawCollection,
    type_names: &HashSet<&str>,
    lookup_named: &mut dyn FnMut(&str) -> SchemaResult<CollectionDefinition>,
) -> SchemaResult<CollectionDefinition> {
    let declared = [
        raw.entry_type.is_some(),
        raw.entry_collection_name.is_some(),
        raw.entry_collection.is_some(),
    ]
    .iter()
    .filter(|d| **d)
    .count();
    if declared > 1 {
        return Err(SchemaError::AmbiguousEntryKind {
            name: raw.name.clone(),
        });
    }

    let contained = if let Some(type_name) = &raw.entry_type {
        if !type_names.contains(type_name.as_str()) {
            return Err(SchemaError::UnknownEntryType {
                name: raw.name.clone(),
                target: type_name.clone(),
            });
        }
        ContainedType::Nodes {
            type_name: type_name.clone(),
        }
    } else if let Some(target) = &raw.entry_collection_name {
        let inner = lookup_named(target)?;
        ContainedType::Collections(Box::new(inner))
    } else if let Some(inner) = &raw.entry_collection {
        let mut inner_def = convert_collection(inner, type_names, lookup_named)?;
        inner_def.local = true;
        ContainedType::Collections(Box::new(inner_def))
    } else {
        return Err(SchemaError::MissingEntryKind {
            name: raw.name.clone(),
        });
    };

    Ok(CollectionDefinition {
        name: raw.name.clone(),
        required: raw.required,
        contained,
        local: false,
        inherited: false,
    })
}

// --- raw -> resolved conversion (no inheritance yet) ---

fn convert_type(
    raw: &RawType,
    type_names: &HashSet<&str>,
    globals: &HashMap<String, CollectionDefinition>,
) -> SchemaResult<TypeDefinition> {
    check_child_duplicates(&raw.name, raw)?;

    let mut collections = Vec::with_capacity(raw.collections.len());
    for c in &raw.collections {
        let def = convert_collection(c, type_names, &mut |target| {
            globals
                .get(target)
                .cloned()
                .ok_or_else(|| SchemaError::UnknownEntryCollection {
                    name: c.name.clone(),
                    target: target.to_string(),
                })
        })?;
        collections.push(def);
    }

    let mut embedded = Vec::with_capacity(raw.embedded.len());
    for e in &raw.embedded {
        if !type_names.contains(e.type_name.as_str()) {
            return Err(SchemaError::UnknownEmbeddedTarget {
                owner: raw.name.clone(),
                slot: e.title.clone().unwrap_or_else(|| "<untitled>".to_string()),
                target: e.type_name.clone(),
            });
        }
        embedded.push(convert_embedded(e));
    }

    Ok(TypeDefinition {
        name: raw.name.clone(),
        base: raw.extends.clone(),
        ancestors: Vec::new(),
        fields: raw.fields.iter().map(convert_field).collect(),
        sections: raw.sections.iter().map(convert_section).collect(),
        collections,
        embedded,
    })
}

fn check_child_duplicates(owner: &str, raw: &RawType) -> SchemaResult<()> {
    for (kind, names) in [
        (
            "field",
            raw.fields.iter().map(|f| f.name.as_str()).collect::<Vec<_>>(),
        ),
        (
            "section",
            raw.sections.iter().map(|s| s.name.as_str()).collect(),
        ),
        (
            "collection",
            raw.collections.iter().map(|c| c.name.as_str()).collect(),
        ),
    ] {
        let mut seen = HashSet::new();
        for name in names {
            if !seen.insert(name) {
                return Err(SchemaError::DuplicateChild {
                    kind,
                    owner: owner.to_string(),
                    child: name.to_string(),
                });
            }
        }
    }
    Ok(())
}

fn convert_field(raw: &RawField) -> FieldDefinition {
    FieldDefinition {
        name: raw.name.clone(),
        required: raw.required,
        shape: raw.shape,
        fields: raw.fields.iter().map(convert_field).collect(),
        picklist: raw.picklist.clone(),
        inherited: false,
    }
}

fn convert_section(raw: &RawSection) -> SectionDefinition {
    SectionDefinition {
        name: raw.name.clone(),
        required: raw.required,
        freeform: raw.freeform,
        fields: raw.fields.iter().map(convert_field).collect(),
        sections: raw.sections.iter().map(convert_section).collect(),
        inherited: false,
    }
}

fn convert_embedded(raw: &RawEmbedded) -> EmbeddedDefinition {
    EmbeddedDefinition {
        title: raw.title.clone(),
        required: raw.required,
        type_name: raw.type_name.clone(),
        inherited: false,
    }
}

// --- inheritance merge ---

/// Merge a resolved base into a freshly converted derived definition.
/// Derived keeps identity; scalar flags OR; children union by name with
/// recursive merge; base-only children are cloned in and marked inherited.
fn merge_type(base: &TypeDefinition, derived: TypeDefinition) -> TypeDefinition {
    let mut ancestors = Vec::with_capacity(base.ancestors.len() + 1);
    ancestors.push(base.name.clone());
    ancestors.extend(base.ancestors.iter().cloned());

    TypeDefinition {
        name: derived.name,
        base: derived.base,
        ancestors,
        fields: merge_fields(&base.fields, derived.fields),
        sections: merge_sections(&base.sections, derived.sections),
        collections: merge_collections(&base.collections, derived.collections),
        embedded: merge_embedded(&base.embedded, derived.embedded),
    }
}

fn merge_fields(base: &[FieldDefinition], derived: Vec<FieldDefinition>) -> Vec<FieldDefinition> {
    let mut derived: Vec<Option<FieldDefinition>> = derived.into_iter().map(Some).collect();
    let mut out = Vec::with_capacity(base.len() + derived.len());

    for b in base {
        let slot = derived
            .iter_mut()
            .find(|d| d.as_ref().is_some_and(|d| d.name == b.name));
        match slot {
            Some(slot) => {
                let d = slot.take().expect("slot matched above");
                out.push(FieldDefinition {
                    name: d.name,
                    required: b.required || d.required,
                    shape: d.shape,
                    fields: merge_fields(&b.fields, d.fields),
                    picklist: d.picklist.or_else(|| b.picklist.clone()),
                    inherited: false,
                });
            }
            None => {
                let mut clone = b.clone();
                clone.inherited = true;
                out.push(clone);
            }
        }
    }

    // Remaining derived-only entries: keep authored ones; a stale inherited
    // copy whose base entry disappeared is treated as deleted.
    out.extend(derived.into_iter().flatten().filter(|d| !d.inherited));
    out
}

fn merge_sections(
    base: &[SectionDefinition],
    derived: Vec<SectionDefinition>,
) -> Vec<SectionDefinition> {
    let mut derived: Vec<Option<SectionDefinition>> = derived.into_iter().map(Some).collect();
    let mut out = Vec::with_capacity(base.len() + derived.len());

    for b in base {
        let slot = derived
            .iter_mut()
            .find(|d| d.as_ref().is_some_and(|d| d.name == b.name));
        match slot {
            Some(slot) => {
                let d = slot.take().expect("slot matched above");
                out.push(SectionDefinition {
                    name: d.name,
                    required: b.required || d.required,
                    freeform: b.freeform || d.freeform,
                    fields: merge_fields(&b.fields, d.fields),
                    sections: merge_sections(&b.sections, d.sections),
                    inherited: false,
                });
            }
            None => {
                let mut clone = b.clone();
                clone.inherited = true;
                out.push(clone);
            }
        }
    }

    out.extend(derived.into_iter().flatten().filter(|d| !d.inherited));
    out
}

fn merge_collections(
    base: &[CollectionDefinition],
    derived: Vec<CollectionDefinition>,
) -> Vec<CollectionDefinition> {
    let mut derived: Vec<Option<CollectionDefinition>> = derived.into_iter().map(Some).collect();
    let mut out = Vec::with_capacity(base.len() + derived.len());

    for b in base {
        let slot = derived
            .iter_mut()
            .find(|d| d.as_ref().is_some_and(|d| d.name == b.name));
        match slot {
            Some(slot) => {
                let d = slot.take().expect("slot matched above");
                out.push(CollectionDefinition {
                    name: d.name,
                    required: b.required || d.required,
                    contained: d.contained,
                    local: d.local,
                    inherited: false,
                });
            }
            None => {
                let mut clone = b.clone();
                clone.inherited = true;
                out.push(clone);
            }
        }
    }

    out.extend(derived.into_iter().flatten().filter(|d| !d.inherited));
    out
}

/// Embedded slots are keyed by title; untitled slots key on their target
/// type instead.
fn embedded_key(e: &EmbeddedDefinition) -> String {
    e.title
        .clone()
        .unwrap_or_else(|| format!("<{}>", e.type_name))
}

fn merge_embedded(
    base: &[EmbeddedDefinition],
    derived: Vec<EmbeddedDefinition>,
) -> Vec<EmbeddedDefinition> {
    let mut derived: Vec<Option<EmbeddedDefinition>> = derived.into_iter().map(Some).collect();
    let mut out = Vec::with_capacity(base.len() + derived.len());

    for b in base {
        let key = embedded_key(b);
        let slot = derived
            .iter_mut()
            .find(|d| d.as_ref().is_some_and(|d| embedded_key(d) == key));
        match slot {
            Some(slot) => {
                let d = slot.take().expect("slot matched above");
                out.push(EmbeddedDefinition {
                    title: d.title,
                    required: b.required || d.required,
                    type_name: d.type_name,
                    inherited: false,
                });
            }
            None => {
                let mut clone = b.clone();
                clone.inherited = true;
                out.push(clone);
            }
        }
    }

    out.extend(derived.into_iter().flatten().filter(|d| !d.inherited));
    out
}

// --- post-merge checks ---

fn check_embedded_slots(
    ty: &TypeDefinition,
    types: &HashMap<String, Arc<TypeDefinition>>,
) -> SchemaResult<()> {
    let mut titles = HashSet::new();
    for slot in &ty.embedded {
        if let Some(title) = &slot.title {
            if !titles.insert(title.as_str()) {
                return Err(SchemaError::DuplicateEmbeddedTitle {
                    owner: ty.name.clone(),
                    title: title.clone(),
                });
            }
        }
    }

    let untitled: Vec<&EmbeddedDefinition> =
        ty.embedded.iter().filter(|e| e.title.is_none()).collect();
    for (i, a) in untitled.iter().enumerate() {
        for b in &untitled[i + 1..] {
            if related(&a.type_name, &b.type_name, types) {
                return Err(SchemaError::AmbiguousUntitledEmbedded {
                    owner: ty.name.clone(),
                    first: a.type_name.clone(),
                    second: b.type_name.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Whether two types are in an ancestor/descendant relationship.
fn related(a: &str, b: &str, types: &HashMap<String, Arc<TypeDefinition>>) -> bool {
    if a == b {
        return true;
    }
    let has_ancestor = |name: &str, anc: &str| {
        types
            .get(name)
            .map(|t| t.ancestors.iter().any(|x| x == anc))
            .unwrap_or(false)
    };
    has_ancestor(a, b) || has_ancestor(b, a)
}

fn check_picklist_bindings(
    owner: &str,
    fields: &[FieldDefinition],
    picklists: &HashMap<String, Arc<PicklistDefinition>>,
) -> SchemaResult<()> {
    for field in fields {
        if field.shape == FieldShape::Picklist {
            let binding = field.picklist.as_deref().unwrap_or("");
            let mut segments = binding.split('/');
            let head = segments.next().unwrap_or("");
            let resolved = picklists.get(head).map(|p| {
                let branch: Vec<&str> = segments.collect();
                branch.is_empty() || p.find_entry(&branch).is_some()
            });
            if resolved != Some(true) {
                return Err(SchemaError::UnknownPicklist {
                    owner: owner.to_string(),
                    field: field.name.clone(),
                    picklist: binding.to_string(),
                });
            }
        }
        check_picklist_bindings(owner, &field.fields, picklists)?;
    }
    Ok(())
}

fn check_section_picklists(
    owner: &str,
    section: &SectionDefinition,
    picklists: &HashMap<String, Arc<PicklistDefinition>>,
) -> SchemaResult<()> {
    check_picklist_bindings(owner, &section.fields, picklists)?;
    for sub in &section.sections {
        check_section_picklists(owner, sub, picklists)?;
    }
    Ok(())
}

fn convert_picklist(raw: &RawPicklist) -> PicklistDefinition {
    PicklistDefinition {
        name: raw.name.clone(),
        entries: raw.entries.iter().map(convert_picklist_entry).collect(),
    }
}

fn convert_picklist_entry(raw: &RawPicklistEntry) -> PicklistEntry {
    PicklistEntry {
        name: raw.name.clone(),
        entries: raw.entries.iter().map(convert_picklist_entry).collect(),
    }
}
