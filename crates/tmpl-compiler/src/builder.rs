//! Catalog assembly.
//!
//! This module provides [`TemplateCatalogBuilder`], which walks a
//! [`FileTree`], translates every template, registers the generated units
//! and assembles the resulting [`TemplateCatalog`].
//!
//! # Pipeline
//!
//! ```text
//! TemplateWalker ──► per template:
//!                      1. route scan        (own read, failures mean "no route")
//!                      2. translate         (own read, ParseError is fatal)
//!                      3. register unit     (derives the type name)
//!                      4. fingerprint       (own read, failures are fatal)
//!                      5. append descriptor
//! ```
//!
//! # Parallel Mode
//!
//! Steps 1, 2 and 4 are pure per-file work and can run on a rayon pool.
//! Registration always runs afterwards on the calling thread, in traversal
//! order, so a parallel build returns exactly what a sequential build would.

use std::io;

use rayon::prelude::*;
use tmpl_core::{BuildConfig, ContentHash, Diagnostic, TemplateCatalog, TemplateDescriptor};
use tmpl_parser::{GeneratedCodeResult, MarkupParser, TemplateParser};
use tracing::{debug, info, warn};

use crate::error::BuildError;
use crate::file_tree::FileTree;
use crate::fingerprint;
use crate::registry::{CodeUnitRegistry, CompilationContext};
use crate::route::RouteDirectiveScanner;
use crate::stats::{BuildStats, StatsSnapshot};
use crate::walker::{RelativeFileInfo, TemplateWalker};

/// Everything one build produces.
#[derive(Debug)]
pub struct BuildOutput {
    /// Descriptors of every compiled template, in traversal order.
    pub catalog: TemplateCatalog,
    /// Diagnostics reported by the translator, in traversal order.
    pub diagnostics: Vec<Diagnostic>,
    /// The generated units registered during the build.
    pub context: CompilationContext,
    /// Final build statistics.
    pub stats: StatsSnapshot,
}

impl BuildOutput {
    /// Number of error-severity diagnostics.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    /// Returns `true` if any diagnostic has error severity.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Builds a [`TemplateCatalog`] from a [`FileTree`].
///
/// # Examples
///
/// ```
/// use tmpl_compiler::{MemoryFileTree, TemplateCatalogBuilder};
///
/// let tree = MemoryFileTree::new()
///     .with_file("views/home/index.tmpl", "@route index\n<h1>Hi</h1>")
///     .with_file("notes.txt", "not a template");
///
/// let output = TemplateCatalogBuilder::default().build(&tree)?;
///
/// assert_eq!(output.catalog.len(), 1);
/// let index = output.catalog.get("views/home/index.tmpl").unwrap();
/// assert_eq!(index.full_type_name, "views_home_index::Index");
/// assert_eq!(index.route(), Some("index"));
/// # Ok::<(), tmpl_compiler::BuildError>(())
/// ```
#[derive(Debug)]
pub struct TemplateCatalogBuilder<P = MarkupParser> {
    parser: P,
    walker: TemplateWalker,
    route_scanner: RouteDirectiveScanner,
    registry: CodeUnitRegistry,
    parallel: bool,
    max_parallel_jobs: Option<usize>,
}

impl Default for TemplateCatalogBuilder<MarkupParser> {
    fn default() -> Self {
        Self::new(MarkupParser::new())
    }
}

impl<P: TemplateParser> TemplateCatalogBuilder<P> {
    /// Creates a sequential builder for the default extension.
    #[must_use]
    pub fn new(parser: P) -> Self {
        Self {
            parser,
            walker: TemplateWalker::default(),
            route_scanner: RouteDirectiveScanner::new(),
            registry: CodeUnitRegistry::new(),
            parallel: false,
            max_parallel_jobs: None,
        }
    }

    /// Creates a builder from a validated build configuration.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Config`] if the configuration is invalid.
    pub fn from_config(config: &BuildConfig, parser: P) -> Result<Self, BuildError> {
        config.validate()?;
        Ok(Self::new(parser)
            .with_extension(&config.file_extension)
            .with_parallel(config.parallel)
            .with_max_parallel_jobs(config.max_parallel_jobs))
    }

    /// Sets the template extension, with or without a leading dot.
    #[must_use]
    pub fn with_extension(mut self, extension: &str) -> Self {
        self.walker = TemplateWalker::new(extension);
        self
    }

    /// Enables or disables parallel per-file processing.
    #[must_use]
    pub const fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Limits the number of worker threads used in parallel mode.
    ///
    /// `None` uses rayon's global pool.
    #[must_use]
    pub const fn with_max_parallel_jobs(mut self, jobs: Option<usize>) -> Self {
        self.max_parallel_jobs = jobs;
        self
    }

    /// The walker deciding which files are templates.
    #[inline]
    #[must_use]
    pub fn walker(&self) -> &TemplateWalker {
        &self.walker
    }

    /// Runs a build into a fresh compilation context.
    ///
    /// # Errors
    ///
    /// Returns a [`BuildError`] if the translator malfunctions, a generated
    /// unit is malformed, or a compiled template cannot be read for
    /// fingerprinting. No partial catalog is returned.
    pub fn build(&self, tree: &dyn FileTree) -> Result<BuildOutput, BuildError> {
        self.build_with_stats(tree, &BuildStats::new())
    }

    /// Runs a build that counts into caller-owned `stats`.
    ///
    /// The counters are reset first and can be read from another thread
    /// while the build runs. Every build owns its counters, so concurrent
    /// builds on one builder never mix their statistics.
    ///
    /// # Errors
    ///
    /// See [`build`](Self::build).
    pub fn build_with_stats(
        &self,
        tree: &dyn FileTree,
        stats: &BuildStats,
    ) -> Result<BuildOutput, BuildError> {
        let mut context = CompilationContext::new();
        let (catalog, diagnostics) = self.run(tree, &mut context, stats)?;
        Ok(BuildOutput {
            catalog,
            diagnostics,
            context,
            stats: stats.snapshot(),
        })
    }

    /// Runs a build, registering generated units into `context`.
    ///
    /// On error, `context` keeps the units registered before the failure.
    ///
    /// # Errors
    ///
    /// See [`build`](Self::build).
    pub fn build_into(
        &self,
        tree: &dyn FileTree,
        context: &mut CompilationContext,
    ) -> Result<(TemplateCatalog, Vec<Diagnostic>), BuildError> {
        self.run(tree, context, &BuildStats::new())
    }

    fn run(
        &self,
        tree: &dyn FileTree,
        context: &mut CompilationContext,
        stats: &BuildStats,
    ) -> Result<(TemplateCatalog, Vec<Diagnostic>), BuildError> {
        stats.reset();

        let files = self.walker.collect(tree);
        stats.add_discovered(files.len() as u64);
        info!(
            templates = files.len(),
            extension = %self.walker.extension(),
            parallel = self.parallel,
            "Building template catalog"
        );

        let mut descriptors = Vec::with_capacity(files.len());
        let mut diagnostics = Vec::new();

        if self.parallel {
            for prepared in self.prepare_parallel(&files) {
                self.register(prepared?, context, stats, &mut descriptors, &mut diagnostics)?;
            }
        } else {
            for file in &files {
                let prepared = self.prepare(file, false)?;
                self.register(prepared, context, stats, &mut descriptors, &mut diagnostics)?;
            }
        }

        let catalog = TemplateCatalog::from(descriptors);
        let stats = stats.snapshot();
        info!(
            compiled = stats.compiled,
            excluded = stats.excluded,
            diagnostics = stats.diagnostics,
            "Template catalog built"
        );

        Ok((catalog, diagnostics))
    }

    fn prepare_parallel<'a>(
        &self,
        files: &'a [RelativeFileInfo],
    ) -> Vec<Result<PreparedTemplate<'a>, BuildError>> {
        let run = || {
            files
                .par_iter()
                .map(|file| self.prepare(file, true))
                .collect::<Vec<_>>()
        };

        let Some(jobs) = self.max_parallel_jobs else {
            return run();
        };
        match rayon::ThreadPoolBuilder::new().num_threads(jobs).build() {
            Ok(pool) => pool.install(run),
            Err(err) => {
                warn!(jobs, error = %err, "Cannot create worker pool, using the global pool");
                run()
            }
        }
    }

    /// Runs the pure per-file steps: route scan, translation and, when
    /// `eager_hash` is set, fingerprinting.
    fn prepare<'a>(
        &self,
        file: &'a RelativeFileInfo,
        eager_hash: bool,
    ) -> Result<PreparedTemplate<'a>, BuildError> {
        let path = file.relative_path();
        let entry = file.entry();

        let route = match entry
            .open_read()
            .and_then(|reader| self.route_scanner.scan(reader))
        {
            Ok(route) => route,
            Err(err) => {
                warn!(path, error = %err, "Route scan failed, assuming no route");
                None
            }
        };

        let mut reader = entry
            .open_read()
            .map_err(|err| BuildError::read(path, err))?;
        let result = self
            .parser
            .parse(&mut reader, path)
            .map_err(|err| BuildError::parser(path, err))?;
        drop(reader);

        let hash = eager_hash.then(|| fingerprint::hash_entry(entry));

        Ok(PreparedTemplate {
            file,
            route,
            result,
            hash,
        })
    }

    /// Registers a prepared template and appends its descriptor.
    fn register(
        &self,
        prepared: PreparedTemplate<'_>,
        context: &mut CompilationContext,
        stats: &BuildStats,
        descriptors: &mut Vec<TemplateDescriptor>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<(), BuildError> {
        let PreparedTemplate {
            file,
            route,
            result: GeneratedCodeResult {
                generated_code,
                errors,
            },
            hash,
        } = prepared;
        let path = file.relative_path();

        if !errors.is_empty() {
            let diagnostic_path = file.diagnostic_path();
            diagnostics.extend(errors.iter().map(|e| e.to_diagnostic(&diagnostic_path)));
            stats.add_diagnostics(errors.len() as u64);
            debug!(path, errors = errors.len(), "Template reported errors");
        }

        let full_type_name = match generated_code {
            Some(code) => self.registry.register(context, path, &code)?,
            None => None,
        };
        let Some(full_type_name) = full_type_name else {
            debug!(path, "No type produced, template excluded");
            stats.increment_excluded();
            return Ok(());
        };

        let content_hash: ContentHash = hash
            .unwrap_or_else(|| fingerprint::hash_entry(file.entry()))
            .map_err(|err| BuildError::read(path, err))?;

        debug!(path, type_name = %full_type_name, route = ?route, "Compiled template");
        stats.increment_compiled();
        if route.is_some() {
            stats.increment_routed();
        }

        let entry = file.entry();
        descriptors.push(TemplateDescriptor {
            full_type_name,
            relative_path: path.to_owned(),
            last_modified: entry.last_modified(),
            length: entry.length(),
            content_hash,
            route,
        });
        Ok(())
    }
}

/// Per-file results of the pure build steps.
struct PreparedTemplate<'a> {
    file: &'a RelativeFileInfo,
    route: Option<String>,
    result: GeneratedCodeResult,
    /// Present when fingerprinting ran ahead of registration.
    hash: Option<io::Result<ContentHash>>,
}
