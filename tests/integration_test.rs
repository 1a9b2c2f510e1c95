use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

use dasp_graph::Buffer;
use nodewerk::nodes::{Composite, Sequencer, SquareWave};
use nodewerk::{
    render_audio, Connection, Control, ControlKernel, EngineConfig, Graph, GraphDocument,
    GraphError, NodeId, RenderContext, SampleTime,
};
use proptest::prelude::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn graph() -> Graph {
    init_tracing();
    Graph::with_standard_nodes(EngineConfig::new(48_000))
}

fn render(graph: &Graph, id: NodeId, t: SampleTime) -> Vec<f32> {
    let mut out = vec![0.0; Buffer::LEN];
    let ctx = RenderContext::new(graph.config());
    render_audio(graph.node(id).unwrap(), t, &mut out, 0, &ctx);
    out
}

fn probe(graph: &Graph, id: NodeId) -> (u64, Option<Control>) {
    graph
        .with_control(id, |kernel| match kernel {
            ControlKernel::Probe(p) => (p.count(), p.last()),
            _ => panic!("{id} is not a probe"),
        })
        .unwrap()
}

#[test]
fn shared_producer_renders_once_per_timestamp() {
    let mut g = graph();
    let sine = g.add_node("SineWave", &[("freq", 440.0)]).unwrap();
    let left = g.add_node("Gain", &[]).unwrap();
    let right = g.add_node("Gain", &[]).unwrap();
    let out = g.add_node("Output", &[]).unwrap();
    g.connect(sine, 0, left, 0).unwrap();
    g.connect(sine, 0, right, 0).unwrap();
    g.connect(left, 0, out, 0).unwrap();
    g.connect(right, 0, out, 0).unwrap();

    let mixed = render(&g, out, 0);
    let direct = render(&g, sine, 0);

    assert_eq!(g.node(sine).unwrap().render_count(), 1);
    for (m, d) in mixed.iter().zip(&direct) {
        assert_eq!(*m, 2.0 * d);
    }

    render(&g, out, 0);
    for id in [sine, left, right, out] {
        assert_eq!(g.node(id).unwrap().render_count(), 1);
    }
}

#[test]
fn older_timestamps_replay_the_cached_frame() {
    let mut g = graph();
    let sine = g.add_node("SineWave", &[("freq", 1000.0)]).unwrap();
    let out = g.add_node("Output", &[]).unwrap();
    g.connect(sine, 0, out, 0).unwrap();

    let first = render(&g, out, 64);
    let again = render(&g, out, 64);
    let older = render(&g, out, 0);

    let bits = |v: &[f32]| v.iter().map(|s| s.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(&first), bits(&again));
    assert_eq!(bits(&first), bits(&older));
    assert_eq!(g.node(out).unwrap().last_render_time(), Some(64));
    assert_eq!(g.node(sine).unwrap().render_count(), 1);

    let next = render(&g, out, 128);
    assert_ne!(bits(&first), bits(&next));
    assert_eq!(g.node(sine).unwrap().render_count(), 2);
}

#[test]
fn fan_in_is_summed() {
    let mut g = graph();
    let a = g.add_node("Constant", &[("value", 0.25)]).unwrap();
    let b = g.add_node("Constant", &[("value", 0.5)]).unwrap();
    let out = g.add_node("Output", &[]).unwrap();
    g.connect(a, 0, out, 0).unwrap();
    g.connect(b, 0, out, 0).unwrap();

    assert!(render(&g, out, 0).iter().all(|s| *s == 0.75));
}

proptest! {
    #[test]
    fn fan_in_sum_matches_arithmetic(a in -10.0f32..10.0, b in -10.0f32..10.0) {
        let mut g = graph();
        let x = g.add_node("Constant", &[("value", a)]).unwrap();
        let y = g.add_node("Constant", &[("value", b)]).unwrap();
        let out = g.add_node("Output", &[]).unwrap();
        g.connect(x, 0, out, 0).unwrap();
        g.connect(y, 0, out, 0).unwrap();

        for sample in render(&g, out, 0) {
            prop_assert_eq!(sample, a + b);
        }
    }
}

#[test]
fn audio_feed_overrides_control_on_the_same_port() {
    let mut g = graph();
    let slider = g.add_node("Slider", &[]).unwrap();
    let dc = g.add_node("Constant", &[("value", 0.5)]).unwrap();
    let out = g.add_node("Output", &[]).unwrap();
    g.connect(slider, 0, out, 0).unwrap();
    let audio = g.connect(dc, 0, out, 0).unwrap();

    g.set_input(slider, "value", 7.0).unwrap();
    assert_eq!(g.node(out).unwrap().input_value(0), Some(7.0));
    assert!(render(&g, out, 0).iter().all(|s| *s == 0.5));

    g.disconnect(&audio);
    assert!(render(&g, out, 64).iter().all(|s| *s == 7.0));
}

#[test]
fn held_control_is_upsampled_across_frames() {
    let mut g = graph();
    let dc = g.add_node("Constant", &[]).unwrap();
    g.push_control(dc, 0, Control::Float(0.125)).unwrap();

    for t in [0, 64, 128] {
        assert!(render(&g, dc, t).iter().all(|s| *s == 0.125));
    }
}

#[test]
fn disconnect_is_idempotent() {
    let mut g = graph();
    let dc = g.add_node("Constant", &[("value", 1.0)]).unwrap();
    let out = g.add_node("Output", &[]).unwrap();
    let connection = g.connect(dc, 0, out, 0).unwrap();

    g.disconnect(&connection);
    g.disconnect(&connection);
    nodewerk::disconnect(&connection);

    assert!(g.connections().is_empty());
    assert!(g.node(dc).unwrap().outbound().is_empty());
    assert!(g.node(out).unwrap().inbound().is_empty());
    assert!(render(&g, out, 0).iter().all(|s| *s == 0.0));
    assert!(!g.disconnect_ports(dc, 0, out, 0));
}

#[test]
fn square_phase_reset_is_applied_before_the_next_frame() {
    let mut g = graph();
    let square = g
        .add_node("SquareWave", &[("freq", 480.0), ("width", 0.25)])
        .unwrap();
    let out = g.add_node("Output", &[]).unwrap();
    g.connect(square, 0, out, 0).unwrap();

    g.push_control(square, SquareWave::PHASE, Control::Float(0.3)).unwrap();

    let first = render(&g, out, 0);
    assert!(first.iter().all(|s| *s == -1.0), "{first:?}");

    // phase is ~0.94 here and wraps after sample 5
    let second = render(&g, out, 64);
    assert!(second[..=5].iter().all(|s| *s == -1.0), "{second:?}");
    assert!(second[8..=20].iter().all(|s| *s == 1.0), "{second:?}");
}

#[test]
fn phase_event_is_not_held() {
    let mut g = graph();
    let square = g.add_node("SquareWave", &[]).unwrap();
    g.push_control(square, SquareWave::PHASE, Control::Float(0.75)).unwrap();

    // event ports keep their default slot value
    assert_eq!(g.node(square).unwrap().input_value(SquareWave::PHASE), Some(0.0));
    render(&g, square, 0);
    assert_eq!(g.node(square).unwrap().input_value(SquareWave::PHASE), Some(0.0));
}

#[test]
fn audio_rate_phase_ignores_pushed_phase() {
    let mut g = graph();
    let square = g
        .add_node("SquareWave", &[("freq", 480.0), ("width", 0.3)])
        .unwrap();
    let offset = g.add_node("Constant", &[("value", 0.25)]).unwrap();
    g.connect(offset, 0, square, SquareWave::PHASE).unwrap();

    g.push_control(square, SquareWave::PHASE, Control::Float(0.3)).unwrap();

    // phase sits at 0.01 + 0.25 every sample
    for t in [0, 64] {
        let frame = render(&g, square, t);
        assert!(frame.iter().all(|s| *s == 1.0), "t = {t}: {frame:?}");
    }
}

#[test]
fn level_edits_do_not_crowd_out_events() {
    let mut g = graph();
    let square = g.add_node("SquareWave", &[("width", 0.5)]).unwrap();

    for _ in 0..100 {
        g.set_input(square, "freq", 0.0).unwrap();
    }
    g.push_control(square, SquareWave::PHASE, Control::Float(0.75)).unwrap();

    let frame = render(&g, square, 0);
    assert!(frame.iter().all(|s| *s == -1.0), "{frame:?}");
}

#[test]
fn sequencer_wraps_and_emits_every_advance() {
    let mut g = graph();
    let seq = g
        .add_node("Sequencer", &[("steps", 4.0), ("bpm", 60.0)])
        .unwrap();
    let probe_id = g.add_node("Probe", &[]).unwrap();
    g.connect(seq, 0, probe_id, 0).unwrap();

    g.with_sequencer(seq, |s| {
        for (step, value) in [0.1, 0.5, 0.9, 0.2].into_iter().enumerate() {
            s.set_step_value(0, step, value);
        }
    })
    .unwrap();

    let renderer = g.renderer();
    for k in 0..=5 {
        renderer.tick(k * 48_000);
    }

    let (count, last) = probe(&g, probe_id);
    assert_eq!(count, 5);
    assert_eq!(last, Some(Control::Float(0.1)));
    assert_eq!(g.with_sequencer(seq, |s| s.current_step()), Some(0));
}

#[test]
fn sequencer_steps_follow_edits() {
    let mut g = graph();
    let seq = g.add_node("Sequencer", &[]).unwrap();
    assert_eq!(g.with_sequencer(seq, |s| s.num_steps()), Some(8));

    g.set_input(seq, "steps", 3.0).unwrap();
    g.set_input(seq, "bpm", 5000.0).unwrap();
    assert_eq!(g.with_sequencer(seq, |s| s.num_steps()), Some(3));
    assert_eq!(g.with_sequencer(seq, |s| s.bpm()), Some(999.0));
    assert_eq!(g.with_sequencer(seq, |s| s.num_sequences()), Some(Sequencer::LANES));
}

#[test]
fn timer_bangs_while_processing() {
    let mut g = graph();
    let timer = g.add_node("Timer", &[("interval", 0.01)]).unwrap();
    let probe_id = g.add_node("Probe", &[]).unwrap();
    g.connect(timer, 0, probe_id, 0).unwrap();

    let mut renderer = g.renderer();
    let mut block = vec![0.0; 4_800];
    renderer.process(&mut block);

    assert_eq!(renderer.clock(), 4_800);
    assert_eq!(probe(&g, probe_id), (9, Some(Control::Bang)));
}

#[test]
fn render_thread_skips_a_busy_control_node() {
    let mut g = graph();
    let timer = g.add_node("Timer", &[("interval", 0.001)]).unwrap();
    let tap = g.add_node("Probe", &[]).unwrap();
    g.connect(timer, 0, tap, 0).unwrap();

    let mut renderer = g.renderer();
    let held = Barrier::new(2);
    let elapsed = thread::scope(|s| {
        s.spawn(|| {
            g.with_control(tap, |_| {
                held.wait();
                thread::sleep(Duration::from_millis(500));
            })
        });
        held.wait();
        let start = Instant::now();
        renderer.process(&mut [0.0; 4_800]);
        start.elapsed()
    });
    assert!(elapsed < Duration::from_millis(250), "{elapsed:?}");

    let (before, _) = probe(&g, tap);
    renderer.process(&mut [0.0; 4_800]);
    let (after, _) = probe(&g, tap);
    assert!(after > before, "{before} -> {after}");
}

#[test]
fn control_chains_reach_audio_inputs() {
    let mut g = graph();
    let slider = g.add_node("Slider", &[]).unwrap();
    let tap = g.add_node("Probe", &[]).unwrap();
    let dc = g.add_node("Constant", &[]).unwrap();
    g.connect(slider, 0, tap, 0).unwrap();
    g.connect(tap, 0, dc, 0).unwrap();

    g.set_input(slider, "value", 0.3).unwrap();

    assert_eq!(probe(&g, tap), (1, Some(Control::Float(0.3))));
    assert!(render(&g, dc, 0).iter().all(|s| *s == 0.3));
}

#[test]
fn gesture_fields_leave_on_their_own_ports() {
    let mut g = graph();
    let gesture = g.add_node("Gesture", &[]).unwrap();
    let pressure = g.add_node("Probe", &[]).unwrap();
    g.connect(gesture, 2, pressure, 0).unwrap();

    g.feed(gesture, Control::vector(&[0.1, 0.2, 0.8, 0.0, 0.5])).unwrap();

    assert_eq!(probe(&g, pressure), (1, Some(Control::Float(0.8))));
}

#[test]
fn invalid_connections_are_rejected() {
    let mut g = graph();
    let dc = g.add_node("Constant", &[]).unwrap();
    let out = g.add_node("Output", &[]).unwrap();
    let seq = g.add_node("Sequencer", &[]).unwrap();
    let slider = g.add_node("Slider", &[]).unwrap();

    assert!(matches!(
        g.add_node("Theremin", &[]),
        Err(GraphError::UnknownNodeType(_))
    ));
    assert!(matches!(
        g.add_node("Constant", &[("volume", 1.0)]),
        Err(GraphError::UnknownParam { .. })
    ));
    assert!(matches!(
        g.connect(dc, 1, out, 0),
        Err(GraphError::PortOutOfRange { direction: "output", .. })
    ));
    assert!(matches!(
        g.connect(dc, 0, out, 9),
        Err(GraphError::PortOutOfRange { direction: "input", .. })
    ));
    assert!(matches!(
        g.connect(slider, 0, seq, Sequencer::STEPS),
        Err(GraphError::PortNotConnectable { port: "steps", .. })
    ));
    assert!(matches!(
        g.connect(dc, 0, seq, Sequencer::BPM),
        Err(GraphError::RateMismatch { .. })
    ));
    assert!(matches!(
        g.add_sink(slider),
        Err(GraphError::NotAudioNode(_))
    ));

    g.connect(dc, 0, out, 0).unwrap();
    assert!(matches!(
        g.connect(dc, 0, out, 0),
        Err(GraphError::DuplicateConnection { .. })
    ));
    assert_eq!(g.connections().len(), 1);
}

#[test]
fn cycles_are_rejected() {
    let mut g = graph();
    let a = g.add_node("Gain", &[]).unwrap();
    let b = g.add_node("Gain", &[]).unwrap();
    let c = g.add_node("Gain", &[]).unwrap();
    g.connect(a, 0, b, 0).unwrap();
    g.connect(b, 0, c, 1).unwrap();

    assert!(matches!(g.connect(c, 0, a, 0), Err(GraphError::Cycle { .. })));
    assert!(matches!(g.connect(a, 0, a, 1), Err(GraphError::Cycle { .. })));
}

#[test]
fn forced_cycle_renders_finite_output() {
    let mut g = graph();
    let one = g.add_node("Constant", &[("value", 1.0)]).unwrap();
    let a = g.add_node("Gain", &[]).unwrap();
    let b = g.add_node("Gain", &[]).unwrap();
    let out = g.add_node("Output", &[]).unwrap();
    g.connect(one, 0, a, 0).unwrap();
    g.connect(a, 0, b, 0).unwrap();
    g.connect(a, 0, out, 0).unwrap();

    // bypass validation
    let back = Connection::new(g.node(b).unwrap(), 0, g.node(a).unwrap(), 0);
    nodewerk::connect(&back);

    let first = render(&g, out, 0);
    assert!(first.iter().all(|s| s.is_finite()));
    assert!(first.iter().all(|s| *s == 1.0));
    let second = render(&g, out, 64);
    assert!(second.iter().all(|s| s.is_finite()));
}

#[test]
fn deep_chains_stop_at_the_render_depth() {
    init_tracing();
    let mut g = Graph::with_standard_nodes(EngineConfig::new(48_000).with_max_render_depth(4));
    let dc = g.add_node("Constant", &[("value", 1.0)]).unwrap();
    let mut last = dc;
    for _ in 0..8 {
        let gain = g.add_node("Gain", &[]).unwrap();
        g.connect(last, 0, gain, 0).unwrap();
        last = gain;
    }

    assert!(render(&g, last, 0).iter().all(|s| *s == 0.0));
}

#[test]
fn removing_a_node_drops_its_connections() {
    let mut g = graph();
    let sine = g.add_node("SineWave", &[]).unwrap();
    let out = g.add_node("Output", &[]).unwrap();
    g.connect(sine, 0, out, 0).unwrap();
    g.add_sink(out).unwrap();

    g.remove_node(sine).unwrap();

    assert!(g.node(sine).is_none());
    assert!(g.connections().is_empty());
    assert!(g.node(out).unwrap().inbound().is_empty());
    assert!(render(&g, out, 0).iter().all(|s| *s == 0.0));
    assert!(matches!(g.remove_node(sine), Err(GraphError::UnknownNode(_))));

    g.remove_node(out).unwrap();
    assert!(g.sinks().is_empty());
    assert!(g.is_empty());
}

#[test]
fn dropping_the_graph_frees_linked_nodes() {
    let mut g = graph();
    let dc = g.add_node("Constant", &[("value", 0.5)]).unwrap();
    let out = g.add_node("Output", &[]).unwrap();
    g.connect(dc, 0, out, 0).unwrap();
    g.add_sink(out).unwrap();

    let weak = [dc, out].map(|id| Arc::downgrade(g.node(id).unwrap()));
    let mut renderer = g.renderer();
    drop(g);

    assert!(weak.iter().all(|w| w.upgrade().is_none()));
    let mut block = [1.0; 128];
    renderer.process(&mut block);
    assert!(block.iter().all(|s| *s == 0.0));
}

#[test]
fn composite_mixes_input_and_subnodes() {
    let mut g = graph();
    let comp = g.add_node("Composite", &[("gain", 0.5)]).unwrap();
    let input = g.add_node("Constant", &[("value", 1.0)]).unwrap();
    let a = g.add_node("Constant", &[("value", 0.25)]).unwrap();
    let b = g.add_node("Constant", &[("value", 0.5)]).unwrap();
    g.connect(input, 0, comp, Composite::INPUT).unwrap();
    g.add_subnode(comp, a).unwrap();
    g.add_subnode(comp, b).unwrap();
    assert_eq!(g.subnodes(comp).unwrap(), vec![a, b]);

    assert!(render(&g, comp, 0).iter().all(|s| *s == 0.875));

    assert!(g.remove_subnode(comp, a));
    assert!(!g.remove_subnode(comp, a));
    assert_eq!(g.subnodes(comp).unwrap(), vec![b]);
    assert!(render(&g, comp, 64).iter().all(|s| *s == 0.75));
}

#[test]
fn subnodes_are_validated() {
    let mut g = graph();
    let comp = g.add_node("Composite", &[]).unwrap();
    let dc = g.add_node("Constant", &[]).unwrap();
    let out = g.add_node("Output", &[]).unwrap();
    let timer = g.add_node("Timer", &[]).unwrap();
    g.connect(comp, 0, out, 0).unwrap();

    assert!(matches!(
        g.connect(dc, 0, comp, Composite::SUBNODES),
        Err(GraphError::PortNotConnectable { .. })
    ));
    assert!(matches!(g.add_subnode(out, dc), Err(GraphError::NotComposite(_))));
    assert!(matches!(g.subnodes(dc), Err(GraphError::NotComposite(_))));
    assert!(matches!(g.add_subnode(comp, timer), Err(GraphError::NotAudioNode(_))));
    assert!(matches!(g.add_subnode(comp, out), Err(GraphError::Cycle { .. })));

    g.add_subnode(comp, dc).unwrap();
    assert!(matches!(
        g.add_subnode(comp, dc),
        Err(GraphError::DuplicateConnection { .. })
    ));
}

#[test]
fn waveform_plays_its_table() {
    let mut g = graph();
    let wave = g.add_node("Waveform", &[("freq", 12_000.0)]).unwrap();
    let dc = g.add_node("Constant", &[]).unwrap();
    g.set_waveform(wave, &[1.0, 0.0, -1.0, 0.0]).unwrap();
    assert_eq!(g.node(wave).unwrap().waveform(), Some(vec![1.0, 0.0, -1.0, 0.0]));

    let frame = render(&g, wave, 0);
    assert_eq!(&frame[..8], &[1.0, 0.0, -1.0, 0.0, 1.0, 0.0, -1.0, 0.0]);

    // a dur edit takes over the pitch: one cycle per 8 samples
    g.set_input(wave, "dur", 8.0 / 48_000.0).unwrap();
    let frame = render(&g, wave, 64);
    assert!((frame[2]).abs() < 1e-3, "{frame:?}");
    assert!((frame[4] + 1.0).abs() < 1e-3, "{frame:?}");

    assert!(matches!(g.set_waveform(wave, &[]), Err(GraphError::EmptyWaveform(_))));
    assert!(matches!(g.set_waveform(dc, &[0.0]), Err(GraphError::NotWaveform(_))));
}

#[test]
fn set_input_clamps_to_port_range() {
    let mut g = graph();
    let square = g.add_node("SquareWave", &[]).unwrap();

    g.set_input(square, "width", 3.0).unwrap();
    assert_eq!(g.node(square).unwrap().input_value(SquareWave::WIDTH), Some(1.0));
    assert!(matches!(
        g.set_input(square, "detune", 0.0),
        Err(GraphError::UnknownParam { .. })
    ));
}

#[test]
fn interleaved_output_duplicates_the_mix() {
    let mut g = graph();
    let dc = g.add_node("Constant", &[("value", 0.5)]).unwrap();
    let out = g.add_node("Output", &[]).unwrap();
    g.connect(dc, 0, out, 0).unwrap();
    g.add_sink(out).unwrap();

    let mut renderer = g.renderer();
    let mut block = vec![0.0; 2 * 100];
    renderer.process_interleaved(&mut block, 2);

    assert!(block.iter().all(|s| *s == 0.5));
    assert_eq!(renderer.clock(), 100);
}

#[test]
fn documents_round_trip() {
    let mut g = graph();
    let square = g.add_node("SquareWave", &[("freq", 330.0)]).unwrap();
    let seq = g.add_node("Sequencer", &[("steps", 4.0)]).unwrap();
    let out = g.add_node("Output", &[("gain", 0.5)]).unwrap();
    g.connect(square, 0, out, 0).unwrap();
    g.connect(seq, 0, square, SquareWave::FREQ).unwrap();
    g.add_sink(out).unwrap();

    let saved = g.to_document();
    let json = saved.to_json().unwrap();
    let parsed = GraphDocument::from_json(&json).unwrap();
    assert_eq!(parsed, saved);

    let mut restored = graph();
    let ids = restored.load_document(&parsed).unwrap();
    assert_eq!(ids.len(), 3);
    assert_eq!(restored.to_document(), saved);
    assert_eq!(restored.sinks(), vec![ids[&out.index()]]);
}

#[test]
fn documents_keep_edited_content() {
    let mut g = graph();
    let seq = g.add_node("Sequencer", &[("steps", 3.0)]).unwrap();
    g.with_sequencer(seq, |s| {
        s.set_step_value(0, 1, 0.5);
        s.set_step_value(3, 2, -2.0);
    })
    .unwrap();
    let wave = g.add_node("Waveform", &[]).unwrap();
    g.set_waveform(wave, &[0.0, 1.0, 0.0]).unwrap();
    let comp = g.add_node("Composite", &[]).unwrap();
    g.add_subnode(comp, wave).unwrap();
    g.add_sink(comp).unwrap();

    let saved = g.to_document();
    assert!(saved.connections.is_empty());

    let json = saved.to_json().unwrap();
    let mut restored = graph();
    let ids = restored
        .load_document(&GraphDocument::from_json(&json).unwrap())
        .unwrap();

    let grid = restored.with_sequencer(ids[&seq.index()], |s| {
        (s.num_steps(), s.step_value(0, 1), s.step_value(3, 2))
    });
    assert_eq!(grid, Some((3, Some(0.5), Some(-2.0))));
    assert_eq!(
        restored.node(ids[&wave.index()]).unwrap().waveform(),
        Some(vec![0.0, 1.0, 0.0])
    );
    assert_eq!(restored.subnodes(ids[&comp.index()]).unwrap(), vec![ids[&wave.index()]]);
    assert_eq!(restored.to_document(), saved);
}

#[test]
fn broken_documents_are_reported() {
    let mut g = graph();
    assert!(matches!(
        GraphDocument::from_json("{\"nodes\": 3}"),
        Err(GraphError::Document(_))
    ));

    let doc = GraphDocument::from_json(
        r#"{"nodes": [{"id": 4, "type": "Output"}],
            "connections": [{"src": 9, "src_port": 0, "dst": 4, "dst_port": 0}]}"#,
    )
    .unwrap();
    assert!(matches!(
        g.load_document(&doc),
        Err(GraphError::UnknownNode(_))
    ));
}

#[test]
fn config_loads_from_toml() {
    let config = EngineConfig::from_toml_str("sample_rate = 44100\nmax_push_depth = 8").unwrap();
    assert_eq!(config.sample_rate(), 44_100);
    assert_eq!(config.max_push_depth(), 8);
    assert_eq!(config.max_render_depth(), 64);

    assert!(matches!(
        EngineConfig::from_toml_str("sample_rate = 44100\nchannels = 2"),
        Err(GraphError::Config(_))
    ));
}

#[test]
fn edits_while_rendering() {
    let mut g = graph();
    let base = g.add_node("Constant", &[("value", 0.25)]).unwrap();
    let extra = g.add_node("Constant", &[("value", 0.5)]).unwrap();
    let out = g.add_node("Output", &[]).unwrap();
    g.connect(base, 0, out, 0).unwrap();
    g.add_sink(out).unwrap();

    let mut renderer = g.renderer();
    let audio = thread::spawn(move || {
        let mut block = [0.0; 256];
        let mut seen = Vec::new();
        for _ in 0..2_000 {
            renderer.process(&mut block);
            seen.extend_from_slice(&block);
        }
        seen
    });

    for _ in 0..500 {
        let connection = g.connect(extra, 0, out, 0).unwrap();
        g.set_input(base, "value", 0.25).unwrap();
        g.disconnect(&connection);
    }

    let seen = audio.join().unwrap();
    assert!(seen.iter().all(|s| *s == 0.25 || *s == 0.75));
}
