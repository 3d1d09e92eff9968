//! Reference XML query adapter.
//!
//! [`Document`] is an in-memory tree built with `quick-xml`; [`PathExpr`] is
//! an XPath 1.0 location-path subset evaluated over it. Together they
//! implement [`QueryEngine`](crate::QueryEngine), which is all the mapping
//! engine needs.
//!
//! Supported path syntax:
//!
//! ```text
//! /a/b          absolute path              a/b        relative path
//! //a           descendant anywhere        a//b       descendant of a
//! .  ..         self, parent               *          any element
//! @id  @*       attributes                 text()  node()
//! a | b         union
//! a[2]  a[last()]  a[@id]  a[@id='x']  a[b!="y"]     predicates
//! child:: attribute:: self:: parent:: descendant:: descendant-or-self::
//! ```
//!
//! Name tests compare local names unless the test itself is prefixed
//! (`x:item` compares the qualified name). Results come back in document
//! order without duplicates.
//!
//! ```
//! use docshape::xml::{Document, PathExpr};
//!
//! let doc = Document::parse(r#"<r><i id="1">a</i><i id="2">b</i></r>"#).unwrap();
//! let path = PathExpr::parse("//i[@id='2']").unwrap();
//! let found = path.evaluate(&doc, doc.root());
//! assert_eq!(doc.text_content(found[0]), "b");
//! ```

#[path = "xml/document.rs"]
mod document;
#[path = "xml/path.rs"]
mod path;

pub use document::{Document, NodeKinds, NodeRef};
pub use path::PathExpr;
