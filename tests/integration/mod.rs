//! Scenario tests: a whole migration described in a rule document, run
//! over a realistic project tree.

mod seedstack_migration;
