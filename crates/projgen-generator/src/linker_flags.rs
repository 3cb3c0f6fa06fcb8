//! Linker flag rewriting.
//!
//! Raw linkopts reference files by their execution-root relative path
//! (`bazel-out/...`, `external/...`). Inside the project those paths have to
//! resolve from the project directory instead, and files the IDE build
//! regenerates itself have to point at the IDE's copy.

use crate::error::PathResolutionError;
use crate::file_path_resolver::FilePathResolver;
use projgen_build::{LinkerInputs, Target};
use projgen_common::FilePath;
use std::collections::BTreeSet;

const SWIFT_MODULE_EXTENSION: &str = "swiftmodule";

/// Whether a target has anything to put in its linker flag build settings.
pub fn has_linker_flags(inputs: &LinkerInputs) -> bool {
    !inputs.linkopts.is_empty()
        || !inputs.static_libraries.is_empty()
        || !inputs.force_load.is_empty()
        || !inputs.exported_symbols_lists.is_empty()
}

/// Rewrites linker inputs into final, quoted linker flags.
#[derive(Debug, Clone, Copy)]
pub struct LinkerFlagProcessor<'a> {
    resolver: &'a FilePathResolver,
    xcode_generated_files: &'a BTreeSet<FilePath>,
}

impl<'a> LinkerFlagProcessor<'a> {
    pub fn new(
        resolver: &'a FilePathResolver,
        xcode_generated_files: &'a BTreeSet<FilePath>,
    ) -> Self {
        Self {
            resolver,
            xcode_generated_files,
        }
    }

    /// All linker flags of `target`, using its platform's Swift triple.
    pub fn target_linker_flags(
        &self,
        target: &Target,
    ) -> Result<Vec<String>, PathResolutionError> {
        self.all_linker_flags(&target.linker_inputs, &target.platform.swift_triple())
    }

    /// Processed linkopts followed by static libraries, `-force_load`
    /// pairs, and `-exported_symbols_list` pairs.
    pub fn all_linker_flags(
        &self,
        inputs: &LinkerInputs,
        swift_triple: &str,
    ) -> Result<Vec<String>, PathResolutionError> {
        let mut flags = inputs
            .linkopts
            .iter()
            .map(|linkopt| self.process_linkopt(linkopt, swift_triple))
            .collect::<Result<Vec<_>, _>>()?;

        for library in &inputs.static_libraries {
            flags.push(self.resolve_input(library)?);
        }

        for library in &inputs.force_load {
            flags.push("-force_load".to_string());
            flags.push(self.resolve_input(library)?);
        }

        // The IDE never regenerates symbol lists, so always use the
        // build-output copy.
        for list in &inputs.exported_symbols_lists {
            flags.push("-exported_symbols_list".to_string());
            flags.push(self.resolver.resolve(list, false)?);
        }

        Ok(flags)
    }

    fn is_xcode_generated(&self, file_path: &FilePath) -> bool {
        self.xcode_generated_files.contains(file_path)
    }

    fn resolve_input(&self, file_path: &FilePath) -> Result<String, PathResolutionError> {
        self.resolver
            .resolve(file_path, self.is_xcode_generated(file_path))
    }

    /// Empty comma segments are dropped, so `-Wl,,-foo` becomes `-Wl,-foo`.
    fn process_linkopt(
        &self,
        linkopt: &str,
        swift_triple: &str,
    ) -> Result<String, PathResolutionError> {
        let components = linkopt
            .split(',')
            .filter(|opt| !opt.is_empty())
            .map(|opt| self.process_linkopt_component(opt, swift_triple))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(components.join(","))
    }

    fn process_linkopt_component(
        &self,
        opt: &str,
        swift_triple: &str,
    ) -> Result<String, PathResolutionError> {
        let (prefix, value) = extract_opt_value(opt);

        let Some(mut file_path) = FilePath::from_execroot_relative(value) else {
            return Ok(opt.to_string());
        };

        let xcode_generated = self.is_xcode_generated(&file_path);
        if xcode_generated && file_path.extension() == Some(SWIFT_MODULE_EXTENSION) {
            // Regenerated module directories are split per target triple.
            file_path = file_path.join(format!("{swift_triple}.{SWIFT_MODULE_EXTENSION}"));
        }

        let value = self.resolver.resolve(&file_path, xcode_generated)?;
        Ok(format!("{prefix}{value}"))
    }
}

/// Split `key=value` once. The prefix keeps its `=`. Options without a
/// non-empty key and a non-empty value have an empty prefix and are taken
/// whole.
fn extract_opt_value(opt: &str) -> (&str, &str) {
    match opt.find('=') {
        Some(index) if index > 0 && index + 1 < opt.len() => opt.split_at(index + 1),
        _ => ("", opt),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use projgen_common::{Environment, Os, Platform, ProductType};
    use projgen_build::Product;

    fn resolver() -> FilePathResolver {
        FilePathResolver::new(
            "/Users/TimApple/project",
            "/some/bazel2/external",
            "/some/bazel2/bazel-out",
            "internal_name",
            "path/to/Foo.xcodeproj",
        )
    }

    fn linkopts(opts: &[&str]) -> LinkerInputs {
        LinkerInputs {
            linkopts: opts.iter().map(|s| s.to_string()).collect(),
            ..LinkerInputs::default()
        }
    }

    #[test]
    fn test_empty_inputs_have_no_flags() {
        let resolver = resolver();
        let generated = BTreeSet::new();
        let processor = LinkerFlagProcessor::new(&resolver, &generated);
        let inputs = LinkerInputs::default();

        assert!(!has_linker_flags(&inputs));
        assert!(processor.all_linker_flags(&inputs, "arm64-apple-ios").unwrap().is_empty());
    }

    #[test]
    fn test_any_input_collection_counts() {
        let mut inputs = LinkerInputs::default();
        inputs.exported_symbols_lists.push(FilePath::workspace("symbols.txt"));
        assert!(has_linker_flags(&inputs));

        let mut inputs = LinkerInputs::default();
        inputs.force_load.push(FilePath::generated("libA.a"));
        assert!(has_linker_flags(&inputs));
    }

    #[test]
    fn test_comma_segments_are_rewritten_independently() {
        let resolver = resolver();
        let generated = BTreeSet::new();
        let processor = LinkerFlagProcessor::new(&resolver, &generated);

        let flags = processor
            .all_linker_flags(
                &linkopts(&[
                    "-Wl,bazel-out/foo/bar.a",
                    "-Wl,-rpath,external/Pkg/lib",
                    "-lsqlite3",
                    "-Wl,,-dead_strip",
                ]),
                "arm64-apple-ios",
            )
            .unwrap();

        assert_eq!(
            flags,
            vec![
                "-Wl,/some/bazel2/bazel-out/foo/bar.a",
                "-Wl,-rpath,/some/bazel2/external/Pkg/lib",
                "-lsqlite3",
                "-Wl,-dead_strip",
            ]
        );
    }

    #[test]
    fn test_options_without_key_are_taken_whole() {
        let resolver = resolver();
        let generated = BTreeSet::new();
        let processor = LinkerFlagProcessor::new(&resolver, &generated);

        let flags = processor
            .all_linker_flags(
                &linkopts(&["=bazel-out/x.a", "-Wl,,-dead_strip", "-order_file=", ",,"]),
                "arm64-apple-ios",
            )
            .unwrap();

        assert_eq!(flags, vec!["=bazel-out/x.a", "-Wl,-dead_strip", "-order_file=", ""]);
    }

    #[test]
    fn test_key_value_prefix_is_preserved() {
        let resolver = resolver();
        let generated = BTreeSet::new();
        let processor = LinkerFlagProcessor::new(&resolver, &generated);

        let flags = processor
            .all_linker_flags(
                &linkopts(&["--sysroot=external/sdk", "-Wl,-order_file=bazel-out/a=b.txt"]),
                "arm64-apple-ios",
            )
            .unwrap();

        assert_eq!(
            flags,
            vec![
                "--sysroot=/some/bazel2/external/sdk",
                "-Wl,-order_file=/some/bazel2/bazel-out/a=b.txt",
            ]
        );
    }

    #[test]
    fn test_regenerated_swiftmodule_gets_triple_suffix() {
        let resolver = resolver();
        let module = FilePath::external("Pkg/Pkg.swiftmodule");
        let opts = linkopts(&["-Wl,-add_ast_path,external/Pkg/Pkg.swiftmodule"]);

        let generated = BTreeSet::from([module.clone()]);
        let processor = LinkerFlagProcessor::new(&resolver, &generated);
        assert_eq!(
            processor.all_linker_flags(&opts, "arm64-apple-ios").unwrap(),
            vec!["-Wl,-add_ast_path,/some/bazel2/external/Pkg/Pkg.swiftmodule/arm64-apple-ios.swiftmodule"]
        );

        let not_generated = BTreeSet::new();
        let processor = LinkerFlagProcessor::new(&resolver, &not_generated);
        assert_eq!(
            processor.all_linker_flags(&opts, "arm64-apple-ios").unwrap(),
            vec!["-Wl,-add_ast_path,/some/bazel2/external/Pkg/Pkg.swiftmodule"]
        );
    }

    #[test]
    fn test_regenerated_generated_files_use_scratch_location() {
        let resolver = resolver();
        let generated = BTreeSet::from([
            FilePath::generated("ios/bin/Mod.swiftmodule"),
            FilePath::generated("ios/bin/libRegen.a"),
        ]);
        let processor = LinkerFlagProcessor::new(&resolver, &generated);

        let inputs = LinkerInputs {
            linkopts: vec!["-Wl,-add_ast_path,bazel-out/ios/bin/Mod.swiftmodule".into()],
            static_libraries: vec![
                FilePath::generated("ios/bin/libRegen.a"),
                FilePath::generated("ios/bin/libPlain.a"),
            ],
            ..LinkerInputs::default()
        };

        insta::assert_snapshot!(
            processor.all_linker_flags(&inputs, "x86_64-apple-ios-simulator").unwrap().join("\n"),
            @r"
        -Wl,-add_ast_path,Foo.xcodeproj/internal_name/bazel-out/ios/bin/Mod.swiftmodule/x86_64-apple-ios-simulator.swiftmodule
        Foo.xcodeproj/internal_name/bazel-out/ios/bin/libRegen.a
        /some/bazel2/bazel-out/ios/bin/libPlain.a
        "
        );
    }

    #[test]
    fn test_trailing_flag_pairs() {
        let resolver = resolver();
        let symbols = FilePath::generated("app/symbols.txt");
        let generated = BTreeSet::from([
            FilePath::generated("app/libForce.a"),
            symbols.clone(),
        ]);
        let processor = LinkerFlagProcessor::new(&resolver, &generated);

        let inputs = LinkerInputs {
            force_load: vec![
                FilePath::generated("app/libForce.a"),
                FilePath::external("Pkg/libPkg.a"),
            ],
            exported_symbols_lists: vec![symbols, FilePath::workspace("app/exported.txt")],
            ..LinkerInputs::default()
        };

        assert_eq!(
            processor.all_linker_flags(&inputs, "arm64-apple-ios").unwrap(),
            vec![
                "-force_load",
                "Foo.xcodeproj/internal_name/bazel-out/app/libForce.a",
                "-force_load",
                "/some/bazel2/external/Pkg/libPkg.a",
                "-exported_symbols_list",
                "/some/bazel2/bazel-out/app/symbols.txt",
                "-exported_symbols_list",
                "../../app/exported.txt",
            ]
        );
    }

    #[test]
    fn test_quoted_values_keep_prefix() {
        let resolver = FilePathResolver::new(
            "/Users/TimApple/project",
            "/some dir/external",
            "/some/bazel-out",
            "rules_xcodeproj",
            "Foo.xcodeproj",
        );
        let generated = BTreeSet::new();
        let processor = LinkerFlagProcessor::new(&resolver, &generated);

        assert_eq!(
            processor
                .all_linker_flags(&linkopts(&["-Wl,external/a/b.a"]), "arm64-apple-ios")
                .unwrap(),
            vec!["-Wl,\"/some dir/external/a/b.a\""]
        );
    }

    #[test]
    fn test_resolution_failure_is_reported() {
        let resolver = FilePathResolver::new(
            "/Users/TimApple/project",
            "/e",
            "/g",
            "i",
            "../../../../Foo.xcodeproj",
        );
        let generated = BTreeSet::new();
        let processor = LinkerFlagProcessor::new(&resolver, &generated);
        let inputs = LinkerInputs {
            exported_symbols_lists: vec![FilePath::workspace("exported.txt")],
            ..LinkerInputs::default()
        };

        let err = processor.all_linker_flags(&inputs, "arm64-apple-ios").unwrap_err();
        assert_eq!(err.path, FilePath::workspace("exported.txt"));
    }

    #[test]
    fn test_target_linker_flags_use_platform_triple() {
        let resolver = resolver();
        let generated = BTreeSet::from([FilePath::generated("Mod.swiftmodule")]);
        let processor = LinkerFlagProcessor::new(&resolver, &generated);
        let target = Target {
            label: "//app:App".into(),
            configuration: "ios-sim".into(),
            product: Product {
                product_type: ProductType::Application,
                name: "App".into(),
                path: None,
            },
            platform: Platform::new(Os::Ios, "arm64", "15.0", Environment::Simulator),
            linker_inputs: linkopts(&["bazel-out/Mod.swiftmodule"]),
        };

        assert_eq!(
            processor.target_linker_flags(&target).unwrap(),
            vec!["Foo.xcodeproj/internal_name/bazel-out/Mod.swiftmodule/arm64-apple-ios-simulator.swiftmodule"]
        );
    }
}
