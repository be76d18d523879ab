//! Shared fixtures for the integration and property tests.

pub mod fixtures {
    //! Hand-built networks with hand-checkable probabilities.

    use reco_bayes::{NetworkDescriptor, NodeDescriptor};
    use reco_calls::constants::{DUMMY_METHOD, NO_METHOD, UNKNOWN_METHOD};
    use reco_calls::TypeName;

    fn node(
        identifier: &str,
        outcomes: &[&str],
        parents: &[&str],
        probabilities: &[f64],
    ) -> NodeDescriptor {
        NodeDescriptor {
            identifier: identifier.into(),
            outcomes: outcomes.iter().map(|s| s.to_string()).collect(),
            parents: parents.iter().map(|s| s.to_string()).collect(),
            probabilities: probabilities.to_vec(),
        }
    }

    /// The receiver type of [`string_network`].
    pub fn string_type() -> TypeName {
        TypeName::new("Ljava/lang/String")
    }

    /// A small but complete call network for `java.lang.String`.
    ///
    /// One context node, one pattern node driving everything else, three
    /// real methods, and the no-method sentinel node.
    pub fn string_network() -> NetworkDescriptor {
        NetworkDescriptor {
            nodes: string_nodes(),
        }
    }

    /// [`string_network`] with the same DAG declared in a different node
    /// order (parents referenced before declaration).
    pub fn shuffled_string_network() -> NetworkDescriptor {
        let mut nodes = string_nodes();
        nodes.reverse();
        NetworkDescriptor { nodes }
    }

    fn string_nodes() -> Vec<NodeDescriptor> {
        vec![
            node(
                "context",
                &["dummy", UNKNOWN_METHOD, "LApp.main([Ljava/lang/String;)V"],
                &[],
                &[0.2, 0.5, 0.3],
            ),
            node(
                "patterns",
                &["dummy", "p1", "p2"],
                &["context"],
                &[0.6, 0.3, 0.1, 0.2, 0.5, 0.3, 0.1, 0.2, 0.7],
            ),
            node(
                "definition",
                &[
                    DUMMY_METHOD,
                    NO_METHOD,
                    UNKNOWN_METHOD,
                    "Ljava/lang/String.<init>()V",
                ],
                &["patterns"],
                &[
                    0.4, 0.3, 0.2, 0.1, //
                    0.1, 0.1, 0.2, 0.6, //
                    0.25, 0.25, 0.25, 0.25,
                ],
            ),
            node(
                "kind",
                &[
                    "METHOD_RETURN",
                    "NEW",
                    "FIELD",
                    "PARAMETER",
                    "THIS",
                    "UNKNOWN",
                    "ANY",
                ],
                &["patterns"],
                &[
                    0.1, 0.1, 0.1, 0.1, 0.1, 0.4, 0.1, //
                    0.05, 0.6, 0.05, 0.05, 0.05, 0.15, 0.05, //
                    0.3, 0.1, 0.1, 0.2, 0.05, 0.2, 0.05,
                ],
            ),
            node(
                "Ljava/lang/String.toLowerCase()Ljava/lang/String;",
                &["true", "false"],
                &["patterns"],
                &[0.3, 0.7, 0.9, 0.1, 0.2, 0.8],
            ),
            node(
                "Ljava/lang/String.length()I",
                &["true", "false"],
                &["patterns"],
                &[0.4, 0.6, 0.7, 0.3, 0.8, 0.2],
            ),
            node(
                "Ljava/lang/String.charAt(I)C",
                &["true", "false"],
                &["patterns"],
                &[0.2, 0.8, 0.3, 0.7, 0.85, 0.15],
            ),
            node(
                "Ljava/lang/String.none()V",
                &["true", "false"],
                &["patterns"],
                &[0.5, 0.5, 0.05, 0.95, 0.1, 0.9],
            ),
        ]
    }

    /// A network whose definition node carries both sentinels, one strong
    /// real definition, and one below-threshold definition.
    pub fn definition_sentinel_network() -> NetworkDescriptor {
        NetworkDescriptor {
            nodes: vec![
                node("context", &["dummy", "LApp.run()V"], &[], &[0.7, 0.3]),
                node("patterns", &["dummy", "p1"], &[], &[0.6, 0.4]),
                node(
                    "definition",
                    &[NO_METHOD, "LX.foo()V", UNKNOWN_METHOD, "LY.bar()V"],
                    &[],
                    &[0.48, 0.4, 0.08, 0.04],
                ),
                node("kind", &["UNKNOWN", "ANY"], &[], &[0.9, 0.1]),
            ],
        }
    }

    /// A network where observing the second context outcome contradicts the
    /// model (the outcome has prior zero).
    pub fn contradictory_network() -> NetworkDescriptor {
        NetworkDescriptor {
            nodes: vec![
                node("context", &["dummy", "LGhost.run()V"], &[], &[1.0, 0.0]),
                node("patterns", &["dummy", "p1"], &[], &[0.5, 0.5]),
                node(
                    "definition",
                    &[DUMMY_METHOD, "LX.a()V"],
                    &[],
                    &[0.5, 0.5],
                ),
                node("kind", &["UNKNOWN", "ANY"], &[], &[0.9, 0.1]),
                node("LT.m()V", &["true", "false"], &[], &[0.5, 0.5]),
            ],
        }
    }
}
