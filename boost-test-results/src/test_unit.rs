// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The Boost.Test test unit tree.
//!
//! Suites own their children through [`Rc`]s. Children point back at their parents through
//! [`Weak`] references, so a tree stays alive only as long as its root does.

use crate::{
    errors::TestUnitError,
    identity::{QualifiedName, QualifiedNameBuilder},
};
use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

/// Whether a test unit is a suite or a case.
#[derive(Debug)]
pub enum TestUnitKind {
    /// A test suite, which may contain other suites and cases.
    Suite {
        /// Child units, in the order they were attached.
        children: RefCell<Vec<Rc<TestUnit>>>,
    },

    /// A test case. Always a leaf.
    Case,
}

/// A node in a Boost.Test test tree.
#[derive(Debug)]
pub struct TestUnit {
    name: String,
    parent: Weak<TestUnit>,
    kind: TestUnitKind,
}

impl TestUnit {
    /// Creates a new test suite, attaching it to `parent` if one is given.
    pub fn new_suite(
        name: impl Into<String>,
        parent: Option<&Rc<TestUnit>>,
    ) -> Result<Rc<Self>, TestUnitError> {
        Self::new_attached(
            name.into(),
            parent,
            TestUnitKind::Suite {
                children: RefCell::new(Vec::new()),
            },
        )
    }

    /// Creates a new test case, attaching it to `parent` if one is given.
    pub fn new_case(
        name: impl Into<String>,
        parent: Option<&Rc<TestUnit>>,
    ) -> Result<Rc<Self>, TestUnitError> {
        Self::new_attached(name.into(), parent, TestUnitKind::Case)
    }

    fn new_attached(
        name: String,
        parent: Option<&Rc<TestUnit>>,
        kind: TestUnitKind,
    ) -> Result<Rc<Self>, TestUnitError> {
        let Some(parent) = parent else {
            return Ok(Rc::new(Self {
                name,
                parent: Weak::new(),
                kind,
            }));
        };

        let TestUnitKind::Suite { children } = &parent.kind else {
            return Err(TestUnitError::ParentIsTestCase {
                parent: parent.name.clone(),
                child: name,
            });
        };

        let unit = Rc::new(Self {
            name,
            parent: Rc::downgrade(parent),
            kind,
        });
        children.borrow_mut().push(Rc::clone(&unit));
        Ok(unit)
    }

    /// Builds a detached chain of suites ending in a test case.
    ///
    /// Returns the root (master) suite, which owns the chain, along with the case. If `name`
    /// is empty the master suite itself is modelled as a case.
    pub fn case_from_qualified_name(
        master_test_suite: &str,
        name: &QualifiedName,
    ) -> Result<(Rc<Self>, Rc<Self>), TestUnitError> {
        let Some((case_name, suites)) = name.segments().split_last() else {
            let case = Self::new_case(master_test_suite, None)?;
            return Ok((Rc::clone(&case), case));
        };

        let root = Self::new_suite(master_test_suite, None)?;
        let mut parent = Rc::clone(&root);
        for suite in suites {
            parent = Self::new_suite(suite.as_str(), Some(&parent))?;
        }
        let case = Self::new_case(case_name.as_str(), Some(&parent))?;
        Ok((root, case))
    }

    /// Returns the local name of this unit.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the kind of this unit.
    pub fn kind(&self) -> &TestUnitKind {
        &self.kind
    }

    /// Returns the parent suite, if this unit has one and it is still alive.
    pub fn parent(&self) -> Option<Rc<TestUnit>> {
        self.parent.upgrade()
    }

    /// Returns true if this unit is a test case.
    pub fn is_case(&self) -> bool {
        matches!(self.kind, TestUnitKind::Case)
    }

    /// Returns true if this unit is a test suite.
    pub fn is_suite(&self) -> bool {
        matches!(self.kind, TestUnitKind::Suite { .. })
    }

    /// Returns the children of this unit. Cases have no children.
    pub fn children(&self) -> Vec<Rc<TestUnit>> {
        match &self.kind {
            TestUnitKind::Suite { children } => children.borrow().clone(),
            TestUnitKind::Case => Vec::new(),
        }
    }

    /// Returns the fully-qualified name of this unit. The root suite contributes nothing.
    pub fn qualified_name(&self) -> QualifiedName {
        QualifiedNameBuilder::from_unit(self).qualified_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::DEFAULT_MASTER_TEST_SUITE_NAME;
    use pretty_assertions::assert_eq;

    #[test]
    fn qualified_names_skip_root() {
        let root = TestUnit::new_suite(DEFAULT_MASTER_TEST_SUITE_NAME, None).unwrap();
        let suite = TestUnit::new_suite("outer", Some(&root)).unwrap();
        let case = TestUnit::new_case("works", Some(&suite)).unwrap();

        assert_eq!(root.qualified_name().to_string(), "");
        assert_eq!(suite.qualified_name().to_string(), "outer");
        assert_eq!(case.qualified_name().to_string(), "outer/works");
        assert_eq!(
            case.parent().map(|parent| parent.name().to_owned()),
            Some("outer".to_owned())
        );

        let names: Vec<_> = root
            .children()
            .iter()
            .map(|child| child.name().to_owned())
            .collect();
        assert_eq!(names, vec!["outer"]);
        assert!(case.children().is_empty());
    }

    #[test]
    fn cases_cannot_have_children() {
        let case = TestUnit::new_case("leaf", None).unwrap();
        let err = TestUnit::new_suite("nested", Some(&case)).unwrap_err();
        assert_eq!(
            err,
            TestUnitError::ParentIsTestCase {
                parent: "leaf".to_owned(),
                child: "nested".to_owned(),
            }
        );
    }

    #[test]
    fn chain_from_qualified_name() {
        let name: QualifiedName = "a/b/c".parse().unwrap();
        let (root, case) = TestUnit::case_from_qualified_name("Module", &name).unwrap();
        assert!(root.is_suite());
        assert!(case.is_case());
        assert_eq!(root.name(), "Module");
        assert_eq!(case.qualified_name(), name);

        let a = &root.children()[0];
        let b = &a.children()[0];
        assert_eq!(a.name(), "a");
        assert!(Rc::ptr_eq(&b.children()[0], &case));
    }

    #[test]
    fn chain_for_master_suite() {
        let (root, case) =
            TestUnit::case_from_qualified_name("Module", &QualifiedName::default()).unwrap();
        assert!(Rc::ptr_eq(&root, &case));
        assert!(case.is_case());
        assert_eq!(case.qualified_name().to_string(), "");
    }

    #[test]
    fn dropping_root_releases_tree() {
        let root = TestUnit::new_suite("root", None).unwrap();
        let case = TestUnit::new_case("case", Some(&root)).unwrap();
        drop(root);
        assert!(case.parent().is_none());
    }
}
