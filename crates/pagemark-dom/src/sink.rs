//! html5ever [`TreeSink`] that builds a [`Document`].
//!
//! The tree builder hands out and receives [`NodeId`]s as handles. Comments
//! and processing instructions get a detached placeholder node that is never
//! attached and is freed once parsing finishes.

use std::borrow::Cow;
use std::cell::{Ref, RefCell, RefMut};
use std::collections::{HashMap, HashSet};

use html5ever::QualName;
use html5ever::tendril::StrTendril;
use html5ever::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink};

use crate::document::{Document, DomError};
use crate::node::{Attribute, NodeId};

fn convert_attr(attr: html5ever::Attribute) -> Attribute {
    let name = match &attr.name.prefix {
        Some(prefix) => format!("{prefix}:{}", attr.name.local),
        None => attr.name.local.to_string(),
    };
    Attribute::new(name, attr.value.to_string())
}

pub(crate) struct DocumentSink {
    document: RefCell<Document>,
    /// Qualified names of created elements, for [`TreeSink::elem_name`].
    names: RefCell<HashMap<NodeId, QualName>>,
    placeholders: RefCell<HashSet<NodeId>>,
}

impl DocumentSink {
    pub(crate) fn new() -> Self {
        Self {
            document: RefCell::new(Document::new()),
            names: RefCell::new(HashMap::new()),
            placeholders: RefCell::new(HashSet::new()),
        }
    }

    fn doc(&self) -> RefMut<'_, Document> {
        self.document.borrow_mut()
    }

    fn is_placeholder(&self, id: NodeId) -> bool {
        self.placeholders.borrow().contains(&id)
    }

    fn placeholder(&self) -> NodeId {
        let id = self.doc().create_text_node("");
        self.placeholders.borrow_mut().insert(id);
        id
    }

    fn report(&self, result: Result<(), DomError>) {
        if let Err(err) = result {
            log::debug!("html tree builder: {err}");
        }
    }
}

impl TreeSink for DocumentSink {
    type Output = Document;

    type Handle = NodeId;

    type ElemName<'a>
        = Ref<'a, QualName>
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        let mut document = self.document.into_inner();
        for id in self.placeholders.into_inner() {
            document.remove(id);
        }
        document
    }

    fn parse_error(&self, msg: Cow<'static, str>) {
        log::trace!("html parse error: {msg}");
    }

    fn get_document(&self) -> Self::Handle {
        self.document.borrow().root()
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> Self::ElemName<'a> {
        Ref::map(self.names.borrow(), |names| {
            names
                .get(target)
                .expect("TreeSink::elem_name called on a node which is not an element")
        })
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<html5ever::Attribute>,
        _flags: ElementFlags,
    ) -> Self::Handle {
        let attrs = attrs.into_iter().map(convert_attr).collect();
        let id = self.doc().create_element(&name.local, attrs);
        self.names.borrow_mut().insert(id, name);
        id
    }

    fn create_comment(&self, _text: StrTendril) -> Self::Handle {
        self.placeholder()
    }

    fn create_pi(&self, _target: StrTendril, _data: StrTendril) -> Self::Handle {
        self.placeholder()
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        let result = match child {
            NodeOrText::AppendNode(id) if self.is_placeholder(id) => Ok(()),
            NodeOrText::AppendNode(id) => self.doc().append_child(*parent, id),
            NodeOrText::AppendText(text) => self.doc().append_text(*parent, &text),
        };
        self.report(result);
    }

    // The tree builder never leaves a text node right after the insertion point.
    fn append_before_sibling(&self, sibling: &Self::Handle, new_node: NodeOrText<Self::Handle>) {
        let result = match new_node {
            NodeOrText::AppendNode(id) if self.is_placeholder(id) => Ok(()),
            NodeOrText::AppendNode(id) => self.doc().insert_before(*sibling, id),
            NodeOrText::AppendText(text) => {
                let mut doc = self.doc();
                let merged = doc
                    .previous_sibling(*sibling)
                    .is_some_and(|prev| doc.push_text(prev, &text).is_ok());
                if merged {
                    Ok(())
                } else {
                    let node = doc.create_text_node(&text);
                    doc.insert_before(*sibling, node)
                }
            }
        };
        self.report(result);
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        let has_parent = self.document.borrow().parent(*element).is_some();
        if has_parent {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        _name: StrTendril,
        _public_id: StrTendril,
        _system_id: StrTendril,
    ) {
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        // Template contents are parsed as ordinary children.
        *target
    }

    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool {
        x == y
    }

    fn set_quirks_mode(&self, _mode: QuirksMode) {}

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<html5ever::Attribute>) {
        let mut doc = self.doc();
        for attr in attrs.into_iter().map(convert_attr) {
            if doc.attr(*target, &attr.name).is_none() {
                let result = doc.set_attr(*target, &attr.name, &attr.value);
                if let Err(err) = result {
                    log::debug!("html tree builder: {err}");
                }
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        self.doc().detach(*target);
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        let mut doc = self.doc();
        let children = doc.children(*node).to_vec();
        for child in children {
            if let Err(err) = doc.append_child(*new_parent, child) {
                log::debug!("html tree builder: {err}");
            }
        }
    }
}
